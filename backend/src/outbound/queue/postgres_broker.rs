//! PostgreSQL-backed `MessageBroker` using a leased message table.
//!
//! `receive` claims the oldest ready row with `FOR UPDATE SKIP LOCKED` and
//! stamps a lease; other consumers skip leased rows until the lease lapses,
//! at which point the message is redelivered. `ack` deletes the row and
//! `requeue` clears the lease and delays the next attempt.
//!
//! Every claim bumps `delivery_count`, and `ack`/`requeue` only touch a row
//! whose count still equals the delivery's attempt. A consumer whose lease
//! lapsed and was reclaimed elsewhere therefore cannot settle the newer
//! claim.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diesel::OptionalExtension as _;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bytea, Double, Int4, Text};
use diesel_async::RunQueryDsl;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ports::{Delivery, MessageBroker, MessageBrokerError, QueueName};
use crate::outbound::persistence::diesel_helpers::pool_error_message;
use crate::outbound::persistence::models::NewQueueMessageRow;
use crate::outbound::persistence::schema::queue_messages;
use crate::outbound::persistence::{DbPool, PoolConfig};

const RECEIVE_SQL: &str = r#"
UPDATE queue_messages
SET locked_until = now() + make_interval(secs => $2),
    delivery_count = delivery_count + 1
WHERE id = (
    SELECT id FROM queue_messages
    WHERE queue = $1
      AND available_at <= now()
      AND (locked_until IS NULL OR locked_until < now())
    ORDER BY available_at, enqueued_at
    LIMIT 1
    FOR UPDATE SKIP LOCKED
)
RETURNING id, queue, payload, delivery_count
"#;

const REQUEUE_SQL: &str = r#"
UPDATE queue_messages
SET locked_until = NULL,
    available_at = now() + make_interval(secs => $2)
WHERE id = $1
  AND delivery_count = $3
"#;

/// Lease and retry timings for [`PostgresMessageBroker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostgresBrokerConfig {
    /// How long a received message stays hidden from other consumers.
    pub lease: Duration,
    /// Delay before a requeued message becomes available again.
    pub requeue_delay: Duration,
}

impl Default for PostgresBrokerConfig {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            requeue_delay: Duration::from_secs(1),
        }
    }
}

#[derive(diesel::QueryableByName)]
struct ClaimedRow {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    id: Uuid,
    #[diesel(sql_type = Text)]
    queue: String,
    #[diesel(sql_type = Bytea)]
    payload: Vec<u8>,
    #[diesel(sql_type = Int4)]
    delivery_count: i32,
}

impl TryFrom<ClaimedRow> for Delivery {
    type Error = MessageBrokerError;

    fn try_from(row: ClaimedRow) -> Result<Self, Self::Error> {
        let queue = row
            .queue
            .parse::<QueueName>()
            .map_err(|err| MessageBrokerError::rejected(err.to_string()))?;
        Ok(Delivery {
            id: row.id,
            queue,
            payload: row.payload,
            attempt: u32::try_from(row.delivery_count.max(1)).unwrap_or(1),
        })
    }
}

/// Durable broker backed by the `queue_messages` table.
#[derive(Clone)]
pub struct PostgresMessageBroker {
    pool: DbPool,
    config: PostgresBrokerConfig,
    closed: Arc<AtomicBool>,
}

impl PostgresMessageBroker {
    /// Build a dedicated pool and wrap it.
    pub async fn connect(
        pool_config: PoolConfig,
        config: PostgresBrokerConfig,
    ) -> Result<Self, MessageBrokerError> {
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|err| MessageBrokerError::unavailable(pool_error_message(err)))?;
        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: DbPool, config: PostgresBrokerConfig) -> Self {
        Self {
            pool,
            config,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Refuse further operations. Claimed messages are left to lapse.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("message broker closed");
        }
    }

    fn ensure_open(&self) -> Result<(), MessageBrokerError> {
        if AtomicBool::load(&self.closed, Ordering::SeqCst) {
            Err(MessageBrokerError::closed())
        } else {
            Ok(())
        }
    }
}

/// The `delivery_count` value that identifies `delivery`'s claim.
fn claim_marker(delivery: &Delivery) -> Result<i32, MessageBrokerError> {
    i32::try_from(delivery.attempt).map_err(|_| {
        MessageBrokerError::rejected(format!("delivery attempt out of range: {}", delivery.attempt))
    })
}

fn map_diesel_error(error: diesel::result::Error) -> MessageBrokerError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            MessageBrokerError::unavailable("database connection error")
        }
        other => {
            debug!(error = %other, "broker statement failed");
            MessageBrokerError::rejected("database error")
        }
    }
}

#[async_trait]
impl MessageBroker for PostgresMessageBroker {
    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| MessageBrokerError::unavailable(pool_error_message(err)))?;

        diesel::insert_into(queue_messages::table)
            .values(&NewQueueMessageRow {
                id: Uuid::new_v4(),
                queue: queue.as_str(),
                payload: &payload,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, MessageBrokerError> {
        self.ensure_open()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| MessageBrokerError::unavailable(pool_error_message(err)))?;

        let row: Option<ClaimedRow> = sql_query(RECEIVE_SQL)
            .bind::<Text, _>(queue.as_str())
            .bind::<Double, _>(self.config.lease.as_secs_f64())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(Delivery::try_from).transpose()
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        let claim = claim_marker(delivery)?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| MessageBrokerError::unavailable(pool_error_message(err)))?;

        let deleted = diesel::delete(
            queue_messages::table
                .filter(queue_messages::id.eq(delivery.id))
                .filter(queue_messages::delivery_count.eq(claim)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if deleted == 0 {
            debug!(
                message_id = %delivery.id,
                attempt = delivery.attempt,
                "ack ignored: message removed or reclaimed"
            );
        }
        Ok(())
    }

    async fn requeue(&self, delivery: &Delivery) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        let claim = claim_marker(delivery)?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| MessageBrokerError::unavailable(pool_error_message(err)))?;

        let updated = sql_query(REQUEUE_SQL)
            .bind::<diesel::sql_types::Uuid, _>(delivery.id)
            .bind::<Double, _>(self.config.requeue_delay.as_secs_f64())
            .bind::<Int4, _>(claim)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            debug!(
                message_id = %delivery.id,
                attempt = delivery.attempt,
                "requeue ignored: message removed or reclaimed"
            );
        }
        Ok(())
    }
}
