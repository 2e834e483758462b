//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{GroupId, PageRequest, Post, PostContent, PostId, UserId};

use super::diesel_helpers::{collect_rows, map_basic_diesel_error, page_bounds, pool_error_message};
use super::models::{NewPostRow, PostRow};
use super::pool::{DbPool, PoolError};
use super::schema::posts;

/// Diesel-backed implementation of the `PostRepository` port.
///
/// Deleting a post relies on `ON DELETE CASCADE` to remove its comments and
/// their replies in the same statement.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    map_basic_diesel_error(
        error,
        |message| PostRepositoryError::query(message),
        |message| PostRepositoryError::connection(message),
    )
}

fn to_domain(row: PostRow) -> Result<Post, PostRepositoryError> {
    Post::try_from(row).map_err(PostRepositoryError::query)
}

fn to_domain_page(rows: Vec<PostRow>) -> Result<Vec<Post>, PostRepositoryError> {
    collect_rows(rows.into_iter().map(Post::try_from), PostRepositoryError::query)
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(posts::table)
            .values(&NewPostRow::from(post))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PostRow> = posts::table
            .filter(posts::id.eq(id.as_uuid()))
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_domain).transpose()
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        include_hidden: bool,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);

        let mut query = posts::table
            .filter(posts::author_id.eq(author.as_str()))
            .into_boxed();
        if !include_hidden {
            query = query.filter(posts::visible.eq(true));
        }

        let rows: Vec<PostRow> = query
            .select(PostRow::as_select())
            .order((posts::created_at.desc(), posts::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        to_domain_page(rows)
    }

    async fn list_by_group(
        &self,
        group: &GroupId,
        viewer: &UserId,
        page: PageRequest,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);

        let rows: Vec<PostRow> = posts::table
            .filter(posts::group_id.eq(group.as_str()))
            .filter(
                posts::visible
                    .eq(true)
                    .or(posts::author_id.eq(viewer.as_str())),
            )
            .select(PostRow::as_select())
            .order((posts::created_at.desc(), posts::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        to_domain_page(rows)
    }

    async fn update_content(
        &self,
        id: &PostId,
        content: &PostContent,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PostRow> = diesel::update(posts::table.filter(posts::id.eq(id.as_uuid())))
            .set((
                posts::title.eq(content.title()),
                posts::body.eq(content.body()),
                posts::updated_at.eq(updated_at),
            ))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_domain).transpose()
    }

    async fn set_visibility(
        &self,
        id: &PostId,
        visible: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PostRow> = diesel::update(posts::table.filter(posts::id.eq(id.as_uuid())))
            .set((posts::visible.eq(visible), posts::updated_at.eq(updated_at)))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_domain).transpose()
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(posts::table.filter(posts::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
