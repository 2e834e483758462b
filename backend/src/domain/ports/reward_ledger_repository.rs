//! Port for the append-only points ledger.

use async_trait::async_trait;

use crate::domain::{RewardLedgerEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reward ledger adapters.
    pub enum RewardLedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "reward ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "reward ledger query failed: {message}",
        /// The store refused the entry; repeating the write cannot succeed.
        Rejected { message: String } => "reward ledger rejected entry: {message}",
    }
}

/// Result of appending to a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// The user does not exist; nothing was written.
    UnknownUser,
}

/// Append-only ledger of reward issuances per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardLedgerRepository: Send + Sync {
    /// Append `entry` to `user`'s ledger. Entries are never updated.
    async fn append(
        &self,
        user: &UserId,
        entry: &RewardLedgerEntry,
    ) -> Result<AppendOutcome, RewardLedgerRepositoryError>;

    /// All entries for `user` in issue order.
    async fn entries_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<RewardLedgerEntry>, RewardLedgerRepositoryError>;
}
