//! Like targets and the toggle state machine.
//!
//! Every likeable entity carries a `like_count` and the list of users who
//! liked it. Membership in that list is the source of truth; the count is
//! kept equal to its length by mutating both in one step.

use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, UserId};

/// The entity a like applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(PostId),
    Comment(CommentId),
    ChildComment { parent: CommentId, child: CommentId },
}

impl LikeTarget {
    /// Short name used in log fields and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Comment(_) => "comment",
            Self::ChildComment { .. } => "child comment",
        }
    }
}

/// Like state for one user on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LikeState {
    Liked,
    Unliked,
}

impl LikeState {
    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }

    pub fn from_liked(liked: bool) -> Self {
        if liked { Self::Liked } else { Self::Unliked }
    }
}

/// Count and caller state after a like mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSnapshot {
    pub like_count: u32,
    pub liked: bool,
}

impl LikeSnapshot {
    pub fn state(&self) -> LikeState {
        LikeState::from_liked(self.liked)
    }
}

/// Outcome of requesting an explicit like state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    /// The state flipped; the snapshot reflects the new count.
    Applied(LikeSnapshot),
    /// The user was already in the requested state.
    Unchanged,
    /// No entity matched the target.
    TargetMissing,
}

/// Likers of a single entity together with their count.
///
/// Adapters without a native atomic update hold this behind their own lock
/// and mutate it through [`LikeLedger::toggle`] or [`LikeLedger::set`].
///
/// # Examples
/// ```
/// use engagement::domain::{LikeLedger, UserId};
///
/// let user = UserId::new("u1").expect("valid id");
/// let mut ledger = LikeLedger::default();
/// assert!(ledger.toggle(&user).liked);
/// assert!(!ledger.toggle(&user).liked);
/// assert_eq!(ledger.count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeLedger {
    like_count: u32,
    liked_users: Vec<UserId>,
}

impl LikeLedger {
    /// Rebuild from persisted likers; the count is derived from membership.
    pub fn from_likers(liked_users: Vec<UserId>) -> Self {
        let like_count = u32::try_from(liked_users.len()).unwrap_or(u32::MAX);
        Self {
            like_count,
            liked_users,
        }
    }

    pub fn count(&self) -> u32 {
        self.like_count
    }

    pub fn likers(&self) -> &[UserId] {
        &self.liked_users
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.liked_users.contains(user)
    }

    /// Snapshot from the viewpoint of `user`.
    pub fn snapshot_for(&self, user: &UserId) -> LikeSnapshot {
        LikeSnapshot {
            like_count: self.like_count,
            liked: self.contains(user),
        }
    }

    /// Flip `user`'s membership and adjust the count.
    pub fn toggle(&mut self, user: &UserId) -> LikeSnapshot {
        if let Some(position) = self.liked_users.iter().position(|id| id == user) {
            self.liked_users.remove(position);
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.liked_users.push(user.clone());
            self.like_count = self.like_count.saturating_add(1);
        }
        self.snapshot_for(user)
    }

    /// Move `user` into `desired`, reporting whether anything changed.
    pub fn set(&mut self, user: &UserId, desired: LikeState) -> LikeChange {
        if self.contains(user) == desired.is_liked() {
            return LikeChange::Unchanged;
        }
        LikeChange::Applied(self.toggle(user))
    }
}
