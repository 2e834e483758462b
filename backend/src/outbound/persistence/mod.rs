//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the engagement ports backed by PostgreSQL via
//! `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Authorisation and event publication stay in the domain.
//! - **Atomic counters**: like toggles and comment counters are single
//!   statements or short transactions, never read-modify-write round trips.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leak into the domain.
//!
//! # Example
//!
//! ```ignore
//! use engagement::outbound::persistence::{DbPool, DieselPostRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/engagement")).await?;
//! let posts = DieselPostRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_comment_repository;
mod diesel_like_repository;
mod diesel_post_repository;
mod diesel_reward_ledger_repository;
mod diesel_user_directory;
mod migrations;
pub(crate) mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_like_repository::DieselLikeRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_reward_ledger_repository::DieselRewardLedgerRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
