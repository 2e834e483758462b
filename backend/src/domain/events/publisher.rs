//! Hands domain events to the broker after a committed mutation.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{MessageBroker, MessageBrokerError};

use super::{DomainEvent, EventEnvelope};

/// Failure to hand an event to the broker.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Broker(#[from] MessageBrokerError),
}

/// Serialises events and enqueues them on their queue.
///
/// Publishing is not transactional with the mutation that produced the
/// event. Callers on the request path use [`EventPublisher::publish_best_effort`],
/// which logs a failure and carries on.
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn MessageBroker>,
    clock: Arc<dyn Clock>,
}

impl EventPublisher {
    pub fn new(broker: Arc<dyn MessageBroker>, clock: Arc<dyn Clock>) -> Self {
        Self { broker, clock }
    }

    /// Enqueue `event`, returning once the broker accepted it.
    pub async fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        let queue = event.queue();
        let envelope = EventEnvelope::new(event, self.clock.utc());
        let payload = envelope.encode()?;
        self.broker.publish(queue, payload).await?;
        debug!(
            queue = %queue,
            event_id = %envelope.event_id,
            kind = envelope.event.kind(),
            "event published"
        );
        Ok(())
    }

    /// Enqueue `event`, logging instead of returning any failure.
    pub async fn publish_best_effort(&self, event: DomainEvent) {
        let queue = event.queue();
        let kind = event.kind();
        if let Err(error) = self.publish(event).await {
            warn!(%queue, kind, %error, "event publish failed; side effect dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockMessageBroker, QueueName};
    use crate::domain::{RewardAction, UserId};
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;

    fn fixed_clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .return_const(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time"));
        Arc::new(clock)
    }

    fn reward() -> DomainEvent {
        DomainEvent::reward(UserId::new("u1").expect("valid id"), RewardAction::CreatePost)
    }

    #[tokio::test]
    async fn publish_routes_encoded_envelope_to_event_queue() {
        let mut broker = MockMessageBroker::new();
        broker
            .expect_publish()
            .withf(|queue, payload| {
                let envelope = EventEnvelope::decode(payload).expect("decodable payload");
                *queue == QueueName::RewardEvents
                    && envelope.event == reward()
                    && envelope.occurred_at.to_rfc3339() == "2026-01-02T03:04:05+00:00"
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let publisher = EventPublisher::new(Arc::new(broker), fixed_clock());
        publisher.publish(reward()).await.expect("publish succeeds");
    }

    #[tokio::test]
    async fn publish_surfaces_broker_failure() {
        let mut broker = MockMessageBroker::new();
        broker
            .expect_publish()
            .times(1)
            .return_once(|_, _| Err(MessageBrokerError::unavailable("connection reset")));

        let publisher = EventPublisher::new(Arc::new(broker), fixed_clock());
        let err = publisher.publish(reward()).await.expect_err("broker down");
        assert!(matches!(err, PublishError::Broker(MessageBrokerError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn best_effort_swallows_failures() {
        let mut broker = MockMessageBroker::new();
        broker
            .expect_publish()
            .times(1)
            .return_once(|_, _| Err(MessageBrokerError::closed()));

        let publisher = EventPublisher::new(Arc::new(broker), fixed_clock());
        publisher.publish_best_effort(reward()).await;
    }
}
