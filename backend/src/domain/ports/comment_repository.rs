//! Port for the two-tier comment store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChildComment, Comment, CommentBody, CommentId, PageRequest, PostId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "comment repository query failed: {message}",
    }
}

/// Durable storage for comments and their embedded replies.
///
/// Top-level inserts and deletes also move the owning post's
/// `comment_count`; adapters must apply both changes atomically. Child
/// operations never touch the post.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a top-level comment and increment its post's counter.
    ///
    /// Returns `false` (and writes nothing) when the post does not exist.
    async fn insert_top_level(&self, comment: &Comment) -> Result<bool, CommentRepositoryError>;

    /// Append `child` to `parent`'s reply list.
    ///
    /// Returns `false` when `parent` does not exist or does not belong to
    /// `post`.
    async fn insert_child(
        &self,
        post: &PostId,
        parent: &CommentId,
        child: &ChildComment,
    ) -> Result<bool, CommentRepositoryError>;

    /// Fetch a top-level comment with its replies.
    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError>;

    /// Oldest-first page of a post's top-level comments with their replies.
    async fn list_for_post(
        &self,
        post: &PostId,
        page: PageRequest,
    ) -> Result<Vec<Comment>, CommentRepositoryError>;

    /// Replace a top-level comment's body. Returns whether a row matched.
    async fn update_body(
        &self,
        id: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError>;

    /// Replace a reply's body. Returns whether a reply matched.
    async fn update_child_body(
        &self,
        parent: &CommentId,
        child: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError>;

    /// Delete a top-level comment, its replies, and decrement the post
    /// counter. Returns whether a comment was removed.
    async fn delete_top_level(&self, id: &CommentId) -> Result<bool, CommentRepositoryError>;

    /// Remove one reply from `parent`. Returns whether a reply was removed.
    async fn delete_child(
        &self,
        parent: &CommentId,
        child: &CommentId,
    ) -> Result<bool, CommentRepositoryError>;
}
