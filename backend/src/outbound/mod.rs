//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **queue**: durable and in-memory message brokers
//! - **mail**: HTTP relay and log-only mail transports
//! - **memory**: process-local repositories for tests and local runs
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod mail;
pub mod memory;
pub mod persistence;
pub mod queue;
