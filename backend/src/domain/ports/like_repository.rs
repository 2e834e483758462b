//! Port for atomic like mutations.

use async_trait::async_trait;

use crate::domain::{LikeChange, LikeSnapshot, LikeState, LikeTarget, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by like repository adapters.
    pub enum LikeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "like repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "like repository query failed: {message}",
    }
}

/// Check-and-mutate operations on a target's likers and count.
///
/// Each call must be a single atomic step in the backing store: two
/// concurrent toggles by different users must both be counted, and two
/// concurrent toggles by the same user must cancel out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Flip `user`'s like on `target`. Returns `None` when the target does
    /// not exist.
    async fn toggle(
        &self,
        target: &LikeTarget,
        user: &UserId,
    ) -> Result<Option<LikeSnapshot>, LikeRepositoryError>;

    /// Move `user` into `desired` on `target` if not already there.
    async fn set(
        &self,
        target: &LikeTarget,
        user: &UserId,
        desired: LikeState,
    ) -> Result<LikeChange, LikeRepositoryError>;
}
