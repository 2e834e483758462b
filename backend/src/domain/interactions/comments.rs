//! Comment tree operations.
//!
//! A comment is either top level (counted on its post) or a reply embedded
//! in a top-level comment. Replies cannot be replied to.

use serde::Serialize;
use tracing::info;

use crate::domain::{
    ChildComment, Comment, CommentBody, CommentId, Error, Page, PageRequest, PostId,
    RewardAction, UserId,
};

use super::posts::post_not_found;
use super::{InteractionService, map_comment_error};

/// Result of [`InteractionService::create_comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "camelCase")]
pub enum CreatedComment {
    TopLevel(Comment),
    #[serde(rename_all = "camelCase")]
    Child {
        parent_comment_id: CommentId,
        comment: ChildComment,
    },
}

impl InteractionService {
    /// Create a comment on `post`, or a reply under `parent` when given.
    ///
    /// Top-level comments increment the post's comment count; replies do
    /// not. A reply's parent must belong to `post`.
    pub async fn create_comment(
        &self,
        actor: &UserId,
        post: &PostId,
        body: CommentBody,
        parent: Option<CommentId>,
    ) -> Result<CreatedComment, Error> {
        self.find_visible_post(actor, post).await?;
        let now = self.clock.utc();

        let created = match parent {
            None => {
                let comment = Comment::new(CommentId::random(), *post, actor.clone(), body, now);
                let inserted = self
                    .comments
                    .insert_top_level(&comment)
                    .await
                    .map_err(map_comment_error)?;
                if !inserted {
                    return Err(post_not_found(post));
                }
                info!(post_id = %post, comment_id = %comment.id, "comment created");
                CreatedComment::TopLevel(comment)
            }
            Some(parent_id) => {
                let child = ChildComment::new(CommentId::random(), actor.clone(), body, now);
                let inserted = self
                    .comments
                    .insert_child(post, &parent_id, &child)
                    .await
                    .map_err(map_comment_error)?;
                if !inserted {
                    return Err(comment_not_found(&parent_id));
                }
                info!(
                    post_id = %post,
                    parent_comment_id = %parent_id,
                    comment_id = %child.id,
                    "child comment created"
                );
                CreatedComment::Child {
                    parent_comment_id: parent_id,
                    comment: child,
                }
            }
        };

        self.reward(actor, RewardAction::CreateComment).await;
        Ok(created)
    }

    /// Oldest-first page of a post's top-level comments with their replies.
    pub async fn get_comments(
        &self,
        viewer: &UserId,
        post: &PostId,
        page: PageRequest,
    ) -> Result<Page<Comment>, Error> {
        self.find_visible_post(viewer, post).await?;
        let comments = self
            .comments
            .list_for_post(post, page)
            .await
            .map_err(map_comment_error)?;
        Ok(Page::new(comments, page))
    }

    /// Replace the body of a comment (or of reply `id` under `parent`).
    pub async fn update_comment(
        &self,
        actor: &UserId,
        id: &CommentId,
        parent: Option<CommentId>,
        body: CommentBody,
    ) -> Result<(), Error> {
        let now = self.clock.utc();
        let updated = match parent {
            None => {
                self.find_owned_comment(actor, id).await?;
                self.comments.update_body(id, &body, now).await
            }
            Some(parent_id) => {
                self.find_owned_child(actor, &parent_id, id).await?;
                self.comments
                    .update_child_body(&parent_id, id, &body, now)
                    .await
            }
        }
        .map_err(map_comment_error)?;

        if !updated {
            return Err(comment_not_found(id));
        }
        Ok(())
    }

    /// Delete a comment (decrementing its post's count) or pull one reply.
    pub async fn delete_comment(
        &self,
        actor: &UserId,
        id: &CommentId,
        parent: Option<CommentId>,
    ) -> Result<(), Error> {
        let removed = match parent {
            None => {
                self.find_owned_comment(actor, id).await?;
                self.comments.delete_top_level(id).await
            }
            Some(parent_id) => {
                self.find_owned_child(actor, &parent_id, id).await?;
                self.comments.delete_child(&parent_id, id).await
            }
        }
        .map_err(map_comment_error)?;

        if !removed {
            return Err(comment_not_found(id));
        }
        info!(comment_id = %id, parent_comment_id = ?parent, "comment deleted");
        Ok(())
    }

    pub(super) async fn find_comment(&self, id: &CommentId) -> Result<Comment, Error> {
        self.comments
            .find_by_id(id)
            .await
            .map_err(map_comment_error)?
            .ok_or_else(|| comment_not_found(id))
    }

    async fn find_owned_comment(&self, actor: &UserId, id: &CommentId) -> Result<Comment, Error> {
        let comment = self.find_comment(id).await?;
        if &comment.author_id != actor {
            return Err(Error::forbidden("only the author may modify this comment"));
        }
        Ok(comment)
    }

    async fn find_owned_child(
        &self,
        actor: &UserId,
        parent: &CommentId,
        id: &CommentId,
    ) -> Result<(), Error> {
        let comment = self.find_comment(parent).await?;
        let child = comment.child(id).ok_or_else(|| comment_not_found(id))?;
        if &child.author_id != actor {
            return Err(Error::forbidden("only the author may modify this comment"));
        }
        Ok(())
    }
}

pub(super) fn comment_not_found(id: &CommentId) -> Error {
    Error::not_found(format!("comment {id} not found"))
}
