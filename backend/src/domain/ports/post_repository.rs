//! Port for post persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{GroupId, PageRequest, Post, PostContent, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
    }
}

/// Durable storage for posts.
///
/// Like and comment counters are not written through this port; they change
/// only through [`LikeRepository`](super::LikeRepository) and
/// [`CommentRepository`](super::CommentRepository) so that each counter moves
/// in the same statement or transaction as the membership it mirrors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new post.
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError>;

    /// Fetch a post by id, regardless of visibility.
    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// Newest-first page of `author`'s posts. Hidden posts are included only
    /// when `include_hidden` is set.
    async fn list_by_author(
        &self,
        author: &UserId,
        include_hidden: bool,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Newest-first page of posts in `group` that `viewer` may see.
    async fn list_by_group(
        &self,
        group: &GroupId,
        viewer: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Replace title and body. Returns `None` when no post matched.
    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError>;

    /// Set the visibility flag. Returns `None` when no post matched.
    async fn set_visibility(
        &self,
        id: &PostId,
        visible: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError>;

    /// Remove the post and every comment under it. Returns whether a post
    /// was removed.
    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError>;
}
