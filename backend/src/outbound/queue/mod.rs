//! Message broker adapters.
//!
//! - [`PostgresMessageBroker`]: durable queues in the `queue_messages` table,
//!   shared by the API process and the workers.
//! - [`InMemoryBroker`]: process-local queues for tests and local runs
//!   without a database.

mod in_memory;
mod postgres_broker;

pub use in_memory::InMemoryBroker;
pub use postgres_broker::{PostgresBrokerConfig, PostgresMessageBroker};
