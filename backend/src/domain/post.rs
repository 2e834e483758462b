//! Post entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, LikeLedger, PostContent, PostId, UserId};

/// A user-authored post, optionally published into a group.
///
/// `comment_count` counts top-level comments only; child comments never
/// touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    #[serde(flatten)]
    pub content: PostContent,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(flatten)]
    pub likes: LikeLedger,
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A freshly created, visible post with zeroed counters.
    pub fn new(
        id: PostId,
        author_id: UserId,
        content: PostContent,
        group_id: Option<GroupId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            content,
            visible: true,
            group_id,
            likes: LikeLedger::default(),
            comment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.author_id == user
    }

    /// Whether `viewer` may see this post.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        self.visible || self.is_authored_by(viewer)
    }
}
