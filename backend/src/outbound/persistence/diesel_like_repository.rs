//! PostgreSQL-backed `LikeRepository` implementation.
//!
//! Each mutation is one `UPDATE` whose `SET` computes both the new liker
//! array and the new count from the same row version. PostgreSQL's row lock
//! serialises concurrent updates of one target, and the
//! `like_count = cardinality(liked_users)` check constraint rejects any
//! statement that would let the two drift.

use async_trait::async_trait;
use diesel::OptionalExtension as _;
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_query;
use diesel::sql_types::{Bool, Int4, Text};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{LikeRepository, LikeRepositoryError};
use crate::domain::{LikeChange, LikeSnapshot, LikeState, LikeTarget, UserId};

use super::diesel_helpers::{map_basic_diesel_error, pool_error_message};
use super::pool::{DbPool, PoolError};

/// Diesel-backed implementation of the `LikeRepository` port.
#[derive(Clone)]
pub struct DieselLikeRepository {
    pool: DbPool,
}

impl DieselLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(diesel::QueryableByName)]
struct LikeRow {
    #[diesel(sql_type = Int4)]
    like_count: i32,
    #[diesel(sql_type = Bool)]
    liked: bool,
}

#[derive(diesel::QueryableByName)]
struct PresenceRow {
    #[diesel(sql_type = Bool)]
    present: bool,
}

/// Resolved row address of a like target.
///
/// Table names come from this closed set only; nothing caller-supplied is
/// ever spliced into SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowAddress {
    table: &'static str,
    id: Uuid,
    parent: Option<Uuid>,
}

impl From<&LikeTarget> for RowAddress {
    fn from(target: &LikeTarget) -> Self {
        match target {
            LikeTarget::Post(id) => Self {
                table: "posts",
                id: *id.as_uuid(),
                parent: None,
            },
            LikeTarget::Comment(id) => Self {
                table: "comments",
                id: *id.as_uuid(),
                parent: None,
            },
            LikeTarget::ChildComment { parent, child } => Self {
                table: "child_comments",
                id: *child.as_uuid(),
                parent: Some(*parent.as_uuid()),
            },
        }
    }
}

impl RowAddress {
    fn row_filter(&self) -> &'static str {
        if self.parent.is_some() {
            "id = $1 AND parent_id = $3"
        } else {
            "id = $1"
        }
    }

    fn toggle_sql(&self) -> String {
        format!(
            "UPDATE {table} SET \
                liked_users = CASE WHEN $2 = ANY(liked_users) \
                    THEN array_remove(liked_users, $2) \
                    ELSE array_append(liked_users, $2) END, \
                like_count = CASE WHEN $2 = ANY(liked_users) \
                    THEN like_count - 1 ELSE like_count + 1 END \
             WHERE {filter} \
             RETURNING like_count, ($2 = ANY(liked_users)) AS liked",
            table = self.table,
            filter = self.row_filter(),
        )
    }

    fn set_sql(&self, desired: LikeState) -> String {
        let (array_op, count_op, guard, liked) = match desired {
            LikeState::Liked => ("array_append", "+", "NOT ($2 = ANY(liked_users))", "TRUE"),
            LikeState::Unliked => ("array_remove", "-", "$2 = ANY(liked_users)", "FALSE"),
        };
        format!(
            "UPDATE {table} SET \
                liked_users = {array_op}(liked_users, $2), \
                like_count = like_count {count_op} 1 \
             WHERE {filter} AND {guard} \
             RETURNING like_count, {liked} AS liked",
            table = self.table,
            filter = self.row_filter(),
        )
    }

    fn presence_sql(&self) -> String {
        format!(
            "SELECT EXISTS (SELECT 1 FROM {table} WHERE {filter}) AS present",
            table = self.table,
            filter = self.row_filter(),
        )
    }

    /// Bind `$1` (row id), `$2` (user) and, for replies, `$3` (parent id).
    fn bind(&self, sql: String, user: &UserId) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
        let query = sql_query(sql)
            .into_boxed::<Pg>()
            .bind::<diesel::sql_types::Uuid, _>(self.id)
            .bind::<Text, _>(user.as_str().to_owned());
        match self.parent {
            Some(parent) => query.bind::<diesel::sql_types::Uuid, _>(parent),
            None => query,
        }
    }
}

fn map_pool_error(error: PoolError) -> LikeRepositoryError {
    LikeRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> LikeRepositoryError {
    map_basic_diesel_error(
        error,
        |message| LikeRepositoryError::query(message),
        |message| LikeRepositoryError::connection(message),
    )
}

fn to_snapshot(row: LikeRow) -> Result<LikeSnapshot, LikeRepositoryError> {
    let like_count = u32::try_from(row.like_count).map_err(|_| {
        LikeRepositoryError::query(format!("negative like count: {}", row.like_count))
    })?;
    Ok(LikeSnapshot {
        like_count,
        liked: row.liked,
    })
}

#[async_trait]
impl LikeRepository for DieselLikeRepository {
    async fn toggle(
        &self,
        target: &LikeTarget,
        user: &UserId,
    ) -> Result<Option<LikeSnapshot>, LikeRepositoryError> {
        let address = RowAddress::from(target);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<LikeRow> = address
            .bind(address.toggle_sql(), user)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(to_snapshot).transpose()
    }

    async fn set(
        &self,
        target: &LikeTarget,
        user: &UserId,
        desired: LikeState,
    ) -> Result<LikeChange, LikeRepositoryError> {
        let address = RowAddress::from(target);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<LikeRow> = address
            .bind(address.set_sql(desired), user)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if let Some(row) = row {
            return to_snapshot(row).map(LikeChange::Applied);
        }

        // Nothing updated: either the target is gone or the state already holds.
        let presence: PresenceRow = address
            .bind(address.presence_sql(), user)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(if presence.present {
            LikeChange::Unchanged
        } else {
            LikeChange::TargetMissing
        })
    }
}
