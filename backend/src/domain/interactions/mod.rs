//! Interaction store service: posts, the two-tier comment tree, and likes.
//!
//! Every mutation is applied synchronously through the repository ports.
//! Once it has committed, the matching reward event is handed to the
//! [`EventPublisher`]; a publish failure is logged and never undoes the
//! mutation.

mod comments;
mod likes;
mod posts;


pub use comments::CreatedComment;

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;

use super::events::{DomainEvent, EventPublisher};
use super::ports::{
    CommentRepository, CommentRepositoryError, LikeRepository, LikeRepositoryError,
    PostRepository, PostRepositoryError,
};
use super::{ContentValidationError, Error, RewardAction, UserId};

/// Repository ports used by [`InteractionService`].
#[derive(Clone)]
pub struct InteractionPorts {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
}

/// Driving service for the interaction store.
#[derive(Clone)]
pub struct InteractionService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl InteractionService {
    pub fn new(ports: InteractionPorts, publisher: EventPublisher, clock: Arc<dyn Clock>) -> Self {
        let InteractionPorts {
            posts,
            comments,
            likes,
        } = ports;
        Self {
            posts,
            comments,
            likes,
            publisher,
            clock,
        }
    }

    async fn reward(&self, user: &UserId, action: RewardAction) {
        self.publisher
            .publish_best_effort(DomainEvent::reward(user.clone(), action))
            .await;
    }
}

fn map_post_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
    }
}

fn map_comment_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("comment repository unavailable: {message}"))
        }
        CommentRepositoryError::Query { message } => {
            Error::internal(format!("comment repository error: {message}"))
        }
    }
}

fn map_like_error(error: LikeRepositoryError) -> Error {
    match error {
        LikeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("like repository unavailable: {message}"))
        }
        LikeRepositoryError::Query { message } => {
            Error::internal(format!("like repository error: {message}"))
        }
    }
}

impl From<ContentValidationError> for Error {
    fn from(error: ContentValidationError) -> Self {
        Error::invalid_request(error.to_string()).with_details(json!({
            "field": error.field(),
            "code": "invalid_content",
        }))
    }
}
