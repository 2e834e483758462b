//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.
//!
//! Top-level comments live in `comments`, replies in `child_comments`.
//! Inserting or deleting a top-level comment adjusts `posts.comment_count`
//! in the same transaction; replies never touch the counter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{ChildComment, Comment, CommentBody, CommentId, PageRequest, PostId};

use super::diesel_helpers::{map_basic_diesel_error, page_bounds, pool_error_message};
use super::models::{
    ChildCommentRow, CommentRow, NewChildCommentRow, NewCommentRow, assemble_comment,
};
use super::pool::{DbPool, PoolError};
use super::schema::{child_comments, comments, posts};

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentRepositoryError {
    CommentRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> CommentRepositoryError {
    map_basic_diesel_error(
        error,
        |message| CommentRepositoryError::query(message),
        |message| CommentRepositoryError::connection(message),
    )
}

/// Attach ordered replies to their parents, preserving the parent order.
fn assemble_page(
    rows: Vec<CommentRow>,
    children: Vec<ChildCommentRow>,
) -> Result<Vec<Comment>, CommentRepositoryError> {
    let mut by_parent: HashMap<Uuid, Vec<ChildCommentRow>> = HashMap::new();
    for child in children {
        by_parent.entry(child.parent_id).or_default().push(child);
    }

    rows.into_iter()
        .map(|row| {
            let replies = by_parent.remove(&row.id).unwrap_or_default();
            assemble_comment(row, replies).map_err(CommentRepositoryError::query)
        })
        .collect()
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn insert_top_level(&self, comment: &Comment) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = *comment.post_id.as_uuid();
        let row = NewCommentRow::from(comment);

        conn.transaction(|conn| {
            async move {
                let bumped = diesel::update(posts::table.filter(posts::id.eq(post_id)))
                    .set(posts::comment_count.eq(posts::comment_count + 1))
                    .execute(conn)
                    .await?;
                if bumped == 0 {
                    return Ok(false);
                }
                diesel::insert_into(comments::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_child(
        &self,
        post: &PostId,
        parent: &CommentId,
        child: &ChildComment,
    ) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = *post.as_uuid();
        let parent_id = *parent.as_uuid();
        let row = NewChildCommentRow::new(parent, child);

        conn.transaction(|conn| {
            async move {
                // Hold the parent so a concurrent delete cannot orphan the reply.
                let found: Option<Uuid> = comments::table
                    .filter(comments::id.eq(parent_id))
                    .filter(comments::post_id.eq(post_id))
                    .select(comments::id)
                    .for_share()
                    .first(conn)
                    .await
                    .optional()?;
                if found.is_none() {
                    return Ok(false);
                }
                diesel::insert_into(child_comments::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let comment_id = *id.as_uuid();

        let found = conn
            .transaction(|conn| {
                async move {
                    let row: Option<CommentRow> = comments::table
                        .filter(comments::id.eq(comment_id))
                        .select(CommentRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let children: Vec<ChildCommentRow> = child_comments::table
                        .filter(child_comments::parent_id.eq(comment_id))
                        .select(ChildCommentRow::as_select())
                        .order((child_comments::created_at.asc(), child_comments::id.asc()))
                        .load(conn)
                        .await?;
                    Ok(Some((row, children)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        found
            .map(|(row, children)| {
                assemble_comment(row, children).map_err(CommentRepositoryError::query)
            })
            .transpose()
    }

    async fn list_for_post(
        &self,
        post: &PostId,
        page: PageRequest,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = *post.as_uuid();
        let (offset, limit) = page_bounds(page);

        let (rows, children) = conn
            .transaction(|conn| {
                async move {
                    let rows: Vec<CommentRow> = comments::table
                        .filter(comments::post_id.eq(post_id))
                        .select(CommentRow::as_select())
                        .order((comments::created_at.asc(), comments::id.asc()))
                        .offset(offset)
                        .limit(limit)
                        .load(conn)
                        .await?;
                    let parent_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
                    let children: Vec<ChildCommentRow> = if parent_ids.is_empty() {
                        Vec::new()
                    } else {
                        child_comments::table
                            .filter(child_comments::parent_id.eq_any(parent_ids))
                            .select(ChildCommentRow::as_select())
                            .order((child_comments::created_at.asc(), child_comments::id.asc()))
                            .load(conn)
                            .await?
                    };
                    Ok((rows, children))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        assemble_page(rows, children)
    }

    async fn update_body(
        &self,
        id: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(comments::table.filter(comments::id.eq(id.as_uuid())))
            .set((
                comments::body.eq(body.as_str()),
                comments::updated_at.eq(updated_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn update_child_body(
        &self,
        parent: &CommentId,
        child: &CommentId,
        body: &CommentBody,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            child_comments::table
                .filter(child_comments::id.eq(child.as_uuid()))
                .filter(child_comments::parent_id.eq(parent.as_uuid())),
        )
        .set((
            child_comments::body.eq(body.as_str()),
            child_comments::updated_at.eq(updated_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete_top_level(&self, id: &CommentId) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let comment_id = *id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let post_id: Option<Uuid> =
                    diesel::delete(comments::table.filter(comments::id.eq(comment_id)))
                        .returning(comments::post_id)
                        .get_result(conn)
                        .await
                        .optional()?;
                let Some(post_id) = post_id else {
                    return Ok(false);
                };
                diesel::update(
                    posts::table
                        .filter(posts::id.eq(post_id))
                        .filter(posts::comment_count.gt(0)),
                )
                .set(posts::comment_count.eq(posts::comment_count - 1))
                .execute(conn)
                .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete_child(
        &self,
        parent: &CommentId,
        child: &CommentId,
    ) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            child_comments::table
                .filter(child_comments::id.eq(child.as_uuid()))
                .filter(child_comments::parent_id.eq(parent.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
