//! In-memory posts, comments and likes behind one lock.
//!
//! One mutex guards the whole store so a like toggle or a comment insert and
//! its counter update happen under a single critical section, mirroring the
//! single-statement updates of the PostgreSQL adapters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CommentRepository, CommentRepositoryError, LikeRepository, LikeRepositoryError,
    PostRepository, PostRepositoryError,
};
use crate::domain::{
    ChildComment, Comment, CommentBody, CommentId, GroupId, LikeChange, LikeLedger, LikeSnapshot,
    LikeState, LikeTarget, PageRequest, Post, PostContent, PostId, UserId,
};

#[derive(Debug, Default)]
struct ContentState {
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
}

impl ContentState {
    fn ledger_mut(&mut self, target: &LikeTarget) -> Option<&mut LikeLedger> {
        match target {
            LikeTarget::Post(id) => self.posts.get_mut(id).map(|post| &mut post.likes),
            LikeTarget::Comment(id) => self.comments.get_mut(id).map(|comment| &mut comment.likes),
            LikeTarget::ChildComment { parent, child } => self
                .comments
                .get_mut(parent)
                .and_then(|comment| comment.child_mut(child))
                .map(|reply| &mut reply.likes),
        }
    }
}

/// Process-local implementation of the post, comment and like ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    state: Arc<Mutex<ContentState>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ContentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Newest first, ties broken by id.
fn newest_first(mut posts: Vec<Post>, page: PageRequest) -> Vec<Post> {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
    page.slice(posts)
}

#[async_trait]
impl PostRepository for InMemoryContentStore {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut state = self.lock();
        if state.posts.contains_key(&post.id) {
            return Err(PostRepositoryError::query(format!("duplicate post id {}", post.id)));
        }
        state.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(self.lock().posts.get(id).cloned())
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        include_hidden: bool,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let matching = self
            .lock()
            .posts
            .values()
            .filter(|post| post.is_authored_by(author) && (include_hidden || post.visible))
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn list_by_group(
        &self,
        group: &GroupId,
        viewer: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let matching = self
            .lock()
            .posts
            .values()
            .filter(|post| post.group_id.as_ref() == Some(group) && post.is_visible_to(viewer))
            .cloned()
            .collect();
        Ok(newest_first(matching, page))
    }

    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut state = self.lock();
        Ok(state.posts.get_mut(id).map(|post| {
            post.content = content.clone();
            post.updated_at = updated_at;
            post.clone()
        }))
    }

    async fn set_visibility(
        &self,
        id: &PostId,
        visible: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut state = self.lock();
        Ok(state.posts.get_mut(id).map(|post| {
            post.visible = visible;
            post.updated_at = updated_at;
            post.clone()
        }))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut state = self.lock();
        if state.posts.remove(id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.post_id != *id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepository for InMemoryContentStore {
    async fn insert_top_level(&self, comment: &Comment) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        let Some(post) = state.posts.get_mut(&comment.post_id) else {
            return Ok(false);
        };
        post.comment_count += 1;
        state.comments.insert(comment.id, comment.clone());
        Ok(true)
    }

    async fn insert_child(
        &self,
        post: &PostId,
        parent: &CommentId,
        child: &ChildComment,
    ) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        match state.comments.get_mut(parent) {
            Some(comment) if comment.post_id == *post => {
                comment.child_comments.push(child.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        Ok(self.lock().comments.get(id).cloned())
    }

    async fn list_for_post(
        &self,
        post: &PostId,
        page: PageRequest,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut matching: Vec<Comment> = self
            .lock()
            .comments
            .values()
            .filter(|comment| comment.post_id == *post)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(page.slice(matching))
    }

    async fn update_body(
        &self,
        id: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        let Some(comment) = state.comments.get_mut(id) else {
            return Ok(false);
        };
        comment.body = body.clone();
        comment.updated_at = updated_at;
        Ok(true)
    }

    async fn update_child_body(
        &self,
        parent: &CommentId,
        child: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        let Some(reply) = state
            .comments
            .get_mut(parent)
            .and_then(|comment| comment.child_mut(child))
        else {
            return Ok(false);
        };
        reply.body = body.clone();
        reply.updated_at = updated_at;
        Ok(true)
    }

    async fn delete_top_level(&self, id: &CommentId) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        let Some(comment) = state.comments.remove(id) else {
            return Ok(false);
        };
        if let Some(post) = state.posts.get_mut(&comment.post_id) {
            post.comment_count = post.comment_count.saturating_sub(1);
        }
        Ok(true)
    }

    async fn delete_child(
        &self,
        parent: &CommentId,
        child: &CommentId,
    ) -> Result<bool, CommentRepositoryError> {
        let mut state = self.lock();
        let Some(comment) = state.comments.get_mut(parent) else {
            return Ok(false);
        };
        let before = comment.child_comments.len();
        comment.child_comments.retain(|reply| reply.id != *child);
        Ok(comment.child_comments.len() < before)
    }
}

#[async_trait]
impl LikeRepository for InMemoryContentStore {
    async fn toggle(
        &self,
        target: &LikeTarget,
        user: &UserId,
    ) -> Result<Option<LikeSnapshot>, LikeRepositoryError> {
        let mut state = self.lock();
        Ok(state.ledger_mut(target).map(|ledger| ledger.toggle(user)))
    }

    async fn set(
        &self,
        target: &LikeTarget,
        user: &UserId,
        desired: LikeState,
    ) -> Result<LikeChange, LikeRepositoryError> {
        let mut state = self.lock();
        Ok(state
            .ledger_mut(target)
            .map_or(LikeChange::TargetMissing, |ledger| ledger.set(user, desired)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("valid id")
    }

    fn post_by(author: &str, created_at: DateTime<Utc>) -> Post {
        Post::new(
            PostId::random(),
            user(author),
            PostContent::new("Title", "Body").expect("valid content"),
            None,
            created_at,
        )
    }

    #[fixture]
    fn store() -> InMemoryContentStore {
        InMemoryContentStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn author_listing_is_newest_first_and_hides_hidden_posts(store: InMemoryContentStore) {
        let base = Utc::now();
        let older = post_by("ada", base);
        let mut hidden = post_by("ada", base + chrono::TimeDelta::seconds(1));
        hidden.visible = false;
        let newer = post_by("ada", base + chrono::TimeDelta::seconds(2));
        for post in [&older, &hidden, &newer] {
            PostRepository::insert(&store, post).await.expect("insert");
        }

        let public = store
            .list_by_author(&user("ada"), false, PageRequest::new(0))
            .await
            .expect("list");
        assert_eq!(
            public.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );

        let own = store
            .list_by_author(&user("ada"), true, PageRequest::new(0))
            .await
            .expect("list");
        assert_eq!(own.len(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn top_level_comments_drive_the_counter(store: InMemoryContentStore) {
        let post = post_by("ada", Utc::now());
        PostRepository::insert(&store, &post).await.expect("insert");
        let body = CommentBody::new("hi").expect("valid body");
        let comment = Comment::new(CommentId::random(), post.id, user("bob"), body.clone(), Utc::now());

        assert!(store.insert_top_level(&comment).await.expect("insert"));
        let reply = ChildComment::new(CommentId::random(), user("cy"), body, Utc::now());
        assert!(store
            .insert_child(&post.id, &comment.id, &reply)
            .await
            .expect("reply"));
        let counted = PostRepository::find_by_id(&store, &post.id)
            .await
            .expect("find")
            .expect("post");
        assert_eq!(counted.comment_count, 1);

        assert!(store.delete_top_level(&comment.id).await.expect("delete"));
        let counted = PostRepository::find_by_id(&store, &post.id)
            .await
            .expect("find")
            .expect("post");
        assert_eq!(counted.comment_count, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn reply_requires_parent_on_same_post(store: InMemoryContentStore) {
        let post = post_by("ada", Utc::now());
        PostRepository::insert(&store, &post).await.expect("insert");
        let body = CommentBody::new("hi").expect("valid body");
        let comment = Comment::new(CommentId::random(), post.id, user("bob"), body.clone(), Utc::now());
        store.insert_top_level(&comment).await.expect("insert");

        let reply = ChildComment::new(CommentId::random(), user("cy"), body, Utc::now());
        assert!(!store
            .insert_child(&PostId::random(), &comment.id, &reply)
            .await
            .expect("reply"));
    }

    #[rstest]
    #[tokio::test]
    async fn like_toggle_on_missing_target_reports_none(store: InMemoryContentStore) {
        let outcome = store
            .toggle(&LikeTarget::Post(PostId::random()), &user("ada"))
            .await
            .expect("toggle");
        assert!(outcome.is_none());
        let change = store
            .set(&LikeTarget::Comment(CommentId::random()), &user("ada"), LikeState::Liked)
            .await
            .expect("set");
        assert_eq!(change, LikeChange::TargetMissing);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_post_removes_its_comments(store: InMemoryContentStore) {
        let post = post_by("ada", Utc::now());
        PostRepository::insert(&store, &post).await.expect("insert");
        let comment = Comment::new(
            CommentId::random(),
            post.id,
            user("bob"),
            CommentBody::new("hi").expect("valid body"),
            Utc::now(),
        );
        store.insert_top_level(&comment).await.expect("insert");

        assert!(PostRepository::delete(&store, &post.id).await.expect("delete"));
        assert!(CommentRepository::find_by_id(&store, &comment.id)
            .await
            .expect("find")
            .is_none());
    }
}
