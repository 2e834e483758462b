//! Two-tier comment model: top-level comments embed their child comments.
//!
//! The nesting depth is fixed at one by construction; [`ChildComment`] has
//! no child list of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentBody, CommentId, LikeLedger, PostId, UserId};

/// Reply to a top-level comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildComment {
    pub id: CommentId,
    pub author_id: UserId,
    pub body: CommentBody,
    #[serde(flatten)]
    pub likes: LikeLedger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildComment {
    pub fn new(id: CommentId, author_id: UserId, body: CommentBody, now: DateTime<Utc>) -> Self {
        Self {
            id,
            author_id,
            body,
            likes: LikeLedger::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Comment attached directly to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: CommentBody,
    #[serde(flatten)]
    pub likes: LikeLedger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Replies in creation order.
    pub child_comments: Vec<ChildComment>,
}

impl Comment {
    pub fn new(
        id: CommentId,
        post_id: PostId,
        author_id: UserId,
        body: CommentBody,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            post_id,
            author_id,
            body,
            likes: LikeLedger::default(),
            created_at: now,
            updated_at: now,
            child_comments: Vec::new(),
        }
    }

    pub fn child(&self, id: &CommentId) -> Option<&ChildComment> {
        self.child_comments.iter().find(|child| &child.id == id)
    }

    pub fn child_mut(&mut self, id: &CommentId) -> Option<&mut ChildComment> {
        self.child_comments.iter_mut().find(|child| &child.id == id)
    }
}
