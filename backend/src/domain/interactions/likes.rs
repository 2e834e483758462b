//! Like, unlike, and toggle operations.

use tracing::debug;

use crate::domain::{
    Error, LikeChange, LikeSnapshot, LikeState, LikeTarget, RewardAction, UserId,
};

use super::{InteractionService, map_like_error};

impl InteractionService {
    /// Flip `actor`'s like on `target` in one atomic step.
    ///
    /// A reward event is published only on the unliked → liked transition.
    pub async fn toggle_like(
        &self,
        actor: &UserId,
        target: &LikeTarget,
    ) -> Result<LikeSnapshot, Error> {
        self.ensure_target_visible(actor, target).await?;
        let snapshot = self
            .likes
            .toggle(target, actor)
            .await
            .map_err(map_like_error)?
            .ok_or_else(|| target_not_found(target))?;
        self.after_like_change(actor, target, snapshot).await;
        Ok(snapshot)
    }

    /// Like `target`; `Conflict` if `actor` already likes it.
    pub async fn like(&self, actor: &UserId, target: &LikeTarget) -> Result<LikeSnapshot, Error> {
        self.set_like(actor, target, LikeState::Liked).await
    }

    /// Remove `actor`'s like; `Conflict` if there is none.
    pub async fn unlike(
        &self,
        actor: &UserId,
        target: &LikeTarget,
    ) -> Result<LikeSnapshot, Error> {
        self.set_like(actor, target, LikeState::Unliked).await
    }

    async fn set_like(
        &self,
        actor: &UserId,
        target: &LikeTarget,
        desired: LikeState,
    ) -> Result<LikeSnapshot, Error> {
        self.ensure_target_visible(actor, target).await?;
        let change = self
            .likes
            .set(target, actor, desired)
            .await
            .map_err(map_like_error)?;
        match change {
            LikeChange::Applied(snapshot) => {
                self.after_like_change(actor, target, snapshot).await;
                Ok(snapshot)
            }
            LikeChange::Unchanged => Err(match desired {
                LikeState::Liked => Error::conflict(format!("{} already liked", target.kind())),
                LikeState::Unliked => Error::conflict(format!("{} not liked", target.kind())),
            }),
            LikeChange::TargetMissing => Err(target_not_found(target)),
        }
    }

    async fn after_like_change(&self, actor: &UserId, target: &LikeTarget, snapshot: LikeSnapshot) {
        debug!(
            target = target.kind(),
            like_count = snapshot.like_count,
            liked = snapshot.liked,
            "like state changed"
        );
        if snapshot.liked {
            let action = match target {
                LikeTarget::Post(_) => RewardAction::PostLiked,
                LikeTarget::Comment(_) | LikeTarget::ChildComment { .. } => {
                    RewardAction::CommentLiked
                }
            };
            self.reward(actor, action).await;
        }
    }

    /// Comments inherit the visibility of the post they hang off.
    async fn ensure_target_visible(&self, actor: &UserId, target: &LikeTarget) -> Result<(), Error> {
        let post = match target {
            LikeTarget::Post(post) => *post,
            LikeTarget::Comment(id) | LikeTarget::ChildComment { parent: id, .. } => {
                self.find_comment(id).await?.post_id
            }
        };
        self.find_visible_post(actor, &post).await.map(|_| ())
    }
}

fn target_not_found(target: &LikeTarget) -> Error {
    match target {
        LikeTarget::Post(id) => Error::not_found(format!("post {id} not found")),
        LikeTarget::Comment(id) | LikeTarget::ChildComment { child: id, .. } => {
            Error::not_found(format!("comment {id} not found"))
        }
    }
}
