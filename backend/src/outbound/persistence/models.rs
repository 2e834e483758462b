//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Row → domain conversions re-validate
//! identifiers and text; a failure there means the table holds data the
//! domain would never have written, and is reported as a message.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ChildComment, Comment, CommentBody, CommentId, GroupId, LikeLedger, Post, PostContent, PostId,
    RewardLedgerEntry, UserId,
};

use super::schema::{child_comments, comments, posts, queue_messages, reward_ledger};

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub visible: bool,
    pub group_id: Option<String>,
    pub liked_users: Vec<String>,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub author_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub visible: bool,
    pub group_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Post> for NewPostRow<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            id: *post.id.as_uuid(),
            author_id: post.author_id.as_str(),
            title: post.content.title(),
            body: post.content.body(),
            visible: post.visible,
            group_id: post.group_id.as_ref().map(GroupId::as_str),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: PostId::from_uuid(row.id),
            author_id: user_id(row.author_id)?,
            content: PostContent::new(row.title, row.body)
                .map_err(|err| format!("invalid post content in database: {err}"))?,
            visible: row.visible,
            group_id: row
                .group_id
                .map(GroupId::new)
                .transpose()
                .map_err(|err| format!("invalid group id in database: {err}"))?,
            likes: likers(row.liked_users)?,
            comment_count: counter(row.comment_count)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: String,
    pub body: String,
    pub liked_users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: &'a str,
    pub body: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Comment> for NewCommentRow<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            id: *comment.id.as_uuid(),
            post_id: *comment.post_id.as_uuid(),
            author_id: comment.author_id.as_str(),
            body: comment.body.as_str(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = child_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChildCommentRow {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub author_id: String,
    pub body: String,
    pub liked_users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = child_comments)]
pub(crate) struct NewChildCommentRow<'a> {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub author_id: &'a str,
    pub body: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewChildCommentRow<'a> {
    pub fn new(parent: &CommentId, child: &'a ChildComment) -> Self {
        Self {
            id: *child.id.as_uuid(),
            parent_id: *parent.as_uuid(),
            author_id: child.author_id.as_str(),
            body: child.body.as_str(),
            created_at: child.created_at,
            updated_at: child.updated_at,
        }
    }
}

impl TryFrom<ChildCommentRow> for ChildComment {
    type Error = String;

    fn try_from(row: ChildCommentRow) -> Result<Self, Self::Error> {
        Ok(ChildComment {
            id: CommentId::from_uuid(row.id),
            author_id: user_id(row.author_id)?,
            body: comment_body(row.body)?,
            likes: likers(row.liked_users)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Assemble a top-level comment from its row and its (ordered) reply rows.
pub(crate) fn assemble_comment(
    row: CommentRow,
    children: Vec<ChildCommentRow>,
) -> Result<Comment, String> {
    let child_comments = children
        .into_iter()
        .map(ChildComment::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Comment {
        id: CommentId::from_uuid(row.id),
        post_id: PostId::from_uuid(row.post_id),
        author_id: user_id(row.author_id)?,
        body: comment_body(row.body)?,
        likes: likers(row.liked_users)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        child_comments,
    })
}

// ---------------------------------------------------------------------------
// Reward ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reward_ledger)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RewardLedgerRow {
    pub action: String,
    pub amount: i32,
    pub issued_at: DateTime<Utc>,
}

impl TryFrom<RewardLedgerRow> for RewardLedgerEntry {
    type Error = String;

    fn try_from(row: RewardLedgerRow) -> Result<Self, Self::Error> {
        Ok(RewardLedgerEntry {
            action: row.action,
            amount: counter(row.amount)?,
            issued_at: row.issued_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queue messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_messages)]
pub(crate) struct NewQueueMessageRow<'a> {
    pub id: Uuid,
    pub queue: &'a str,
    pub payload: &'a [u8],
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn user_id(raw: String) -> Result<UserId, String> {
    UserId::new(raw).map_err(|err| format!("invalid user id in database: {err}"))
}

fn comment_body(raw: String) -> Result<CommentBody, String> {
    CommentBody::new(raw).map_err(|err| format!("invalid comment body in database: {err}"))
}

fn likers(raw: Vec<String>) -> Result<LikeLedger, String> {
    let users = raw
        .into_iter()
        .map(user_id)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LikeLedger::from_likers(users))
}

fn counter(raw: i32) -> Result<u32, String> {
    u32::try_from(raw).map_err(|_| format!("negative counter in database: {raw}"))
}
