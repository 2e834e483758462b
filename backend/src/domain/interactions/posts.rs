//! Post lifecycle operations.

use tracing::info;

use crate::domain::{
    Error, GroupId, Page, PageRequest, Post, PostContent, PostId, RewardAction, UserId,
};

use super::{InteractionService, map_post_error};

impl InteractionService {
    /// Publish a new visible post and reward its author.
    pub async fn create_post(
        &self,
        author: &UserId,
        content: PostContent,
        group: Option<GroupId>,
    ) -> Result<Post, Error> {
        let post = Post::new(
            PostId::random(),
            author.clone(),
            content,
            group,
            self.clock.utc(),
        );
        self.posts.insert(&post).await.map_err(map_post_error)?;
        info!(post_id = %post.id, author = %author, "post created");

        self.reward(author, RewardAction::CreatePost).await;
        Ok(post)
    }

    /// Fetch a post. Hidden posts only resolve for their author.
    pub async fn get_post(&self, viewer: &UserId, id: &PostId) -> Result<Post, Error> {
        self.find_visible_post(viewer, id).await
    }

    /// Newest-first page of `author`'s posts as seen by `viewer`.
    pub async fn list_posts_by_author(
        &self,
        viewer: &UserId,
        author: &UserId,
        page: PageRequest,
    ) -> Result<Page<Post>, Error> {
        let posts = self
            .posts
            .list_by_author(author, viewer == author, page)
            .await
            .map_err(map_post_error)?;
        Ok(Page::new(posts, page))
    }

    /// Newest-first page of a group's posts as seen by `viewer`.
    pub async fn list_posts_by_group(
        &self,
        viewer: &UserId,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<Post>, Error> {
        let posts = self
            .posts
            .list_by_group(group, viewer, page)
            .await
            .map_err(map_post_error)?;
        Ok(Page::new(posts, page))
    }

    pub async fn update_post(
        &self,
        actor: &UserId,
        id: &PostId,
        content: PostContent,
    ) -> Result<Post, Error> {
        self.find_owned_post(actor, id).await?;
        let updated = self
            .posts
            .update_content(id, &content, self.clock.utc())
            .await
            .map_err(map_post_error)?;
        updated.ok_or_else(|| post_not_found(id))
    }

    pub async fn change_visibility(
        &self,
        actor: &UserId,
        id: &PostId,
        visible: bool,
    ) -> Result<Post, Error> {
        self.find_owned_post(actor, id).await?;
        let updated = self
            .posts
            .set_visibility(id, visible, self.clock.utc())
            .await
            .map_err(map_post_error)?;
        info!(post_id = %id, visible, "post visibility changed");
        updated.ok_or_else(|| post_not_found(id))
    }

    /// Delete a post together with its comments.
    pub async fn delete_post(&self, actor: &UserId, id: &PostId) -> Result<(), Error> {
        self.find_owned_post(actor, id).await?;
        let removed = self.posts.delete(id).await.map_err(map_post_error)?;
        if !removed {
            return Err(post_not_found(id));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    pub(super) async fn find_visible_post(
        &self,
        viewer: &UserId,
        id: &PostId,
    ) -> Result<Post, Error> {
        let post = self.posts.find_by_id(id).await.map_err(map_post_error)?;
        post.filter(|post| post.is_visible_to(viewer))
            .ok_or_else(|| post_not_found(id))
    }

    async fn find_owned_post(&self, actor: &UserId, id: &PostId) -> Result<Post, Error> {
        let post = self.find_visible_post(actor, id).await?;
        if !post.is_authored_by(actor) {
            return Err(Error::forbidden("only the author may modify this post"));
        }
        Ok(post)
    }
}

pub(super) fn post_not_found(id: &PostId) -> Error {
    Error::not_found(format!("post {id} not found"))
}
