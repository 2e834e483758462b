//! `DieselCommentRepository` against embedded PostgreSQL.
//!
//! Covers the transactional `comment_count` bookkeeping: top-level comments
//! move the post's counter, replies never do, and cascades clean up replies.

use chrono::Utc;
use engagement::domain::ports::{CommentRepository, PostRepository};
use engagement::domain::{
    ChildComment, Comment, CommentBody, CommentId, PageRequest, Post, PostContent, PostId, UserId,
};
use engagement::outbound::persistence::{DieselCommentRepository, DieselPostRepository};
use rstest::{fixture, rstest};

mod support;

use support::{TestDatabase, database_or_skip};

struct Context {
    db: TestDatabase,
    posts: DieselPostRepository,
    comments: DieselCommentRepository,
    post: PostId,
}

impl Context {
    fn comment_count(&self) -> u32 {
        self.db
            .runtime
            .block_on(self.posts.find_by_id(&self.post))
            .expect("find post")
            .expect("post exists")
            .comment_count
    }

    fn add_top_level(&self, body: &str) -> CommentId {
        let comment = Comment::new(
            CommentId::random(),
            self.post,
            user("commenter"),
            CommentBody::new(body).expect("valid body"),
            Utc::now(),
        );
        let inserted = self
            .db
            .runtime
            .block_on(self.comments.insert_top_level(&comment))
            .expect("insert comment");
        assert!(inserted);
        comment.id
    }

    fn add_reply(&self, parent: &CommentId, body: &str) -> Result<bool, String> {
        let child = ChildComment::new(
            CommentId::random(),
            user("replier"),
            CommentBody::new(body).expect("valid body"),
            Utc::now(),
        );
        self.db
            .runtime
            .block_on(self.comments.insert_child(&self.post, parent, &child))
            .map_err(|err| err.to_string())
    }
}

fn user(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

#[fixture]
fn context() -> Option<Context> {
    let db = database_or_skip(4)?;
    let posts = DieselPostRepository::new(db.pool.clone());
    let comments = DieselCommentRepository::new(db.pool.clone());
    let post = Post::new(
        PostId::random(),
        user("author"),
        PostContent::new("Title", "Body").expect("valid content"),
        None,
        Utc::now(),
    );
    db.runtime.block_on(posts.insert(&post)).expect("insert post");
    Some(Context {
        post: post.id,
        db,
        posts,
        comments,
    })
}

#[rstest]
fn only_top_level_comments_move_the_counter(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: only_top_level_comments_move_the_counter skipped");
        return;
    };

    let first = ctx.add_top_level("first");
    ctx.add_top_level("second");
    assert_eq!(ctx.comment_count(), 2);

    assert_eq!(ctx.add_reply(&first, "reply"), Ok(true));
    assert_eq!(ctx.add_reply(&first, "another"), Ok(true));
    assert_eq!(ctx.comment_count(), 2);

    let listed = ctx
        .db
        .runtime
        .block_on(ctx.comments.list_for_post(&ctx.post, PageRequest::new(0)))
        .expect("list comments");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first);
    assert_eq!(listed[0].child_comments.len(), 2);
}

#[rstest]
fn deleting_top_level_comment_decrements_and_cascades(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_top_level_comment_decrements_and_cascades skipped");
        return;
    };
    let comment = ctx.add_top_level("doomed");
    assert_eq!(ctx.add_reply(&comment, "orphan-to-be"), Ok(true));
    assert_eq!(ctx.comment_count(), 1);

    let rt = &ctx.db.runtime;
    assert!(rt.block_on(ctx.comments.delete_top_level(&comment)).expect("delete"));
    assert_eq!(ctx.comment_count(), 0);
    assert_eq!(
        ctx.db
            .scalar("SELECT count(*) AS value FROM child_comments"),
        0
    );

    assert!(!rt.block_on(ctx.comments.delete_top_level(&comment)).expect("second delete"));
    assert_eq!(ctx.comment_count(), 0);
}

#[rstest]
fn deleting_a_reply_leaves_the_counter_alone(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_a_reply_leaves_the_counter_alone skipped");
        return;
    };
    let parent = ctx.add_top_level("parent");
    ctx.add_reply(&parent, "reply").expect("insert reply");
    let child = ctx
        .db
        .runtime
        .block_on(ctx.comments.find_by_id(&parent))
        .expect("find")
        .expect("parent exists")
        .child_comments[0]
        .id;

    let rt = &ctx.db.runtime;
    assert!(!rt
        .block_on(ctx.comments.delete_child(&CommentId::random(), &child))
        .expect("delete under wrong parent"));
    assert!(rt.block_on(ctx.comments.delete_child(&parent, &child)).expect("delete reply"));
    assert_eq!(ctx.comment_count(), 1);
}

#[rstest]
fn comments_on_missing_posts_are_refused(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: comments_on_missing_posts_are_refused skipped");
        return;
    };
    let stray = Comment::new(
        CommentId::random(),
        PostId::random(),
        user("commenter"),
        CommentBody::new("nowhere").expect("valid body"),
        Utc::now(),
    );
    let rt = &ctx.db.runtime;

    assert!(!rt.block_on(ctx.comments.insert_top_level(&stray)).expect("insert"));
    assert_eq!(ctx.add_reply(&CommentId::random(), "no parent"), Ok(false));
    assert_eq!(ctx.db.scalar("SELECT count(*) AS value FROM comments"), 0);
}
