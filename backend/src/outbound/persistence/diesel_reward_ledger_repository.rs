//! PostgreSQL-backed `RewardLedgerRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Int4, Text, Timestamptz};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AppendOutcome, RewardLedgerRepository, RewardLedgerRepositoryError};
use crate::domain::{RewardLedgerEntry, UserId};

use super::diesel_helpers::{collect_rows, map_basic_diesel_error, pool_error_message};
use super::models::RewardLedgerRow;
use super::pool::{DbPool, PoolError};
use super::schema::reward_ledger;

/// Append a ledger row only when the user exists; zero rows means unknown.
const APPEND_SQL: &str = r#"
INSERT INTO reward_ledger (user_id, action, amount, issued_at)
SELECT $1, $2, $3, $4
WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
"#;

/// Diesel-backed implementation of the `RewardLedgerRepository` port.
#[derive(Clone)]
pub struct DieselRewardLedgerRepository {
    pool: DbPool,
}

impl DieselRewardLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RewardLedgerRepositoryError {
    RewardLedgerRepositoryError::connection(pool_error_message(error))
}

/// Integrity violations are permanent for a given entry; everything else
/// follows the shared classification.
fn map_diesel_error(error: diesel::result::Error) -> RewardLedgerRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(
            kind @ (DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation),
            info,
        ) => RewardLedgerRepositoryError::rejected(format!("{kind:?}: {}", info.message())),
        other => map_basic_diesel_error(
            other,
            |message| RewardLedgerRepositoryError::query(message),
            |message| RewardLedgerRepositoryError::connection(message),
        ),
    }
}

#[async_trait]
impl RewardLedgerRepository for DieselRewardLedgerRepository {
    async fn append(
        &self,
        user: &UserId,
        entry: &RewardLedgerEntry,
    ) -> Result<AppendOutcome, RewardLedgerRepositoryError> {
        let amount = i32::try_from(entry.amount).map_err(|_| {
            RewardLedgerRepositoryError::rejected(format!(
                "reward amount out of range: {}",
                entry.amount
            ))
        })?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = sql_query(APPEND_SQL)
            .bind::<Text, _>(user.as_str())
            .bind::<Text, _>(entry.action.as_str())
            .bind::<Int4, _>(amount)
            .bind::<Timestamptz, _>(entry.issued_at)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(if inserted == 0 {
            AppendOutcome::UnknownUser
        } else {
            AppendOutcome::Appended
        })
    }

    async fn entries_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<RewardLedgerEntry>, RewardLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RewardLedgerRow> = reward_ledger::table
            .filter(reward_ledger::user_id.eq(user.as_str()))
            .select(RewardLedgerRow::as_select())
            .order(reward_ledger::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        collect_rows(
            rows.into_iter().map(RewardLedgerEntry::try_from),
            RewardLedgerRepositoryError::query,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn append_is_guarded_by_user_existence() {
        assert!(APPEND_SQL.contains("WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)"));
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        ));
        assert!(matches!(err, RewardLedgerRepositoryError::Connection { .. }));
    }

    #[rstest]
    #[case(diesel::result::DatabaseErrorKind::CheckViolation)]
    #[case(diesel::result::DatabaseErrorKind::ForeignKeyViolation)]
    #[case(diesel::result::DatabaseErrorKind::NotNullViolation)]
    fn integrity_violations_are_rejections(#[case] kind: diesel::result::DatabaseErrorKind) {
        let err = map_diesel_error(diesel::result::Error::DatabaseError(
            kind,
            Box::new("violates constraint".to_owned()),
        ));
        assert!(matches!(err, RewardLedgerRepositoryError::Rejected { .. }));
    }

    #[rstest]
    fn serialization_failure_stays_retryable() {
        let err = map_diesel_error(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_owned()),
        ));
        assert!(matches!(err, RewardLedgerRepositoryError::Query { .. }));
    }
}
