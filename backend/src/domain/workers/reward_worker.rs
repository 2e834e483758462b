//! Appends reward ledger entries for `reward-events` messages.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::events::DomainEvent;
use crate::domain::ports::{
    AppendOutcome, Delivery, QueueName, RewardLedgerRepository, RewardLedgerRepositoryError,
};
use crate::domain::{RewardAction, RewardLedgerEntry, TraceId, UserId};

use super::{HandlerOutcome, MessageHandler, decode_delivery};

/// Query failures are retried until a delivery reaches this attempt.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Consumer of reward events.
///
/// Redelivered messages append again; the ledger carries no deduplication
/// key, so a reward may be issued more than once.
pub struct RewardWorker {
    ledger: Arc<dyn RewardLedgerRepository>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl RewardWorker {
    pub fn new(ledger: Arc<dyn RewardLedgerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            clock,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Cap redeliveries of a message whose ledger write keeps failing.
    /// Connection failures are exempt and always requeue.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    async fn issue(&self, user: &UserId, action: &RewardAction, attempt: u32) -> HandlerOutcome {
        if action.points() == 0 {
            info!(user_id = %user, %action, "unscored reward action acknowledged without a write");
            return HandlerOutcome::Ack;
        }

        let entry = RewardLedgerEntry::for_action(action, self.clock.utc());
        match self.ledger.append(user, &entry).await {
            Ok(AppendOutcome::Appended) => {
                info!(user_id = %user, %action, amount = entry.amount, "reward issued");
                HandlerOutcome::Ack
            }
            Ok(AppendOutcome::UnknownUser) => {
                warn!(user_id = %user, %action, "reward for unknown user dropped");
                HandlerOutcome::Ack
            }
            Err(err @ RewardLedgerRepositoryError::Connection { .. }) => {
                warn!(user_id = %user, %action, error = %err, "ledger unreachable; requeueing");
                HandlerOutcome::Requeue
            }
            Err(err @ RewardLedgerRepositoryError::Query { .. }) if attempt < self.max_attempts => {
                warn!(user_id = %user, %action, attempt, error = %err, "ledger write failed; requeueing");
                HandlerOutcome::Requeue
            }
            Err(err @ RewardLedgerRepositoryError::Query { .. }) => {
                error!(
                    user_id = %user,
                    %action,
                    attempt,
                    error = %err,
                    "ledger write failed on final attempt; discarding reward"
                );
                HandlerOutcome::Ack
            }
            Err(err @ RewardLedgerRepositoryError::Rejected { .. }) => {
                error!(user_id = %user, %action, error = %err, "ledger rejected reward; discarding");
                HandlerOutcome::Ack
            }
        }
    }
}

#[async_trait]
impl MessageHandler for RewardWorker {
    fn queue(&self) -> QueueName {
        QueueName::RewardEvents
    }

    async fn handle(&self, delivery: &Delivery) -> HandlerOutcome {
        let Some(envelope) = decode_delivery(delivery) else {
            return HandlerOutcome::Ack;
        };
        let DomainEvent::Reward { user_id, action } = &envelope.event else {
            error!(
                delivery_id = %delivery.id,
                event_id = %envelope.event_id,
                kind = envelope.event.kind(),
                "unexpected event on reward queue; discarding"
            );
            return HandlerOutcome::Ack;
        };

        TraceId::scope_optional(
            envelope.trace_id(),
            self.issue(user_id, action, delivery.attempt),
        )
        .await
    }
}
