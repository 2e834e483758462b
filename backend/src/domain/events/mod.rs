//! Domain events and their wire envelope.
//!
//! Events are encoded as JSON envelopes:
//!
//! ```json
//! {
//!   "eventId": "…",
//!   "traceId": "…",
//!   "occurredAt": "2026-01-01T00:00:00Z",
//!   "event": { "type": "reward", "userId": "u1", "action": "createPost" }
//! }
//! ```
//!
//! `eventId` and `traceId` exist for log correlation. Consumers do not
//! deduplicate on them.

mod publisher;

pub use publisher::{EventPublisher, PublishError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ports::QueueName;
use super::{EmailAddress, RewardAction, TraceId, UserId};

/// Side effect to perform after a primary mutation succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    Reward {
        user_id: UserId,
        action: RewardAction,
    },
    Notification {
        recipient: EmailAddress,
        subject: String,
        body: String,
    },
}

impl DomainEvent {
    pub fn reward(user_id: UserId, action: RewardAction) -> Self {
        Self::Reward { user_id, action }
    }

    pub fn notification(
        recipient: EmailAddress,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Notification {
            recipient,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Queue the event is routed to.
    pub fn queue(&self) -> QueueName {
        match self {
            Self::Reward { .. } => QueueName::RewardEvents,
            Self::Notification { .. } => QueueName::EmailEvents,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reward { .. } => "reward",
            Self::Notification { .. } => "notification",
        }
    }
}

/// Error decoding a queue payload.
#[derive(Debug, thiserror::Error)]
#[error("malformed event payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Serialised form of a [`DomainEvent`] on a queue.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use engagement::domain::{DomainEvent, EventEnvelope, RewardAction, UserId};
///
/// let user = UserId::new("u1").expect("valid id");
/// let envelope = EventEnvelope::new(DomainEvent::reward(user, RewardAction::PostLiked), Utc::now());
/// let bytes = envelope.encode().expect("encode");
/// assert_eq!(EventEnvelope::decode(&bytes).expect("decode"), envelope);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    /// Wrap `event`, stamping the trace identifier currently in scope.
    pub fn new(event: DomainEvent, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            trace_id: TraceId::current().map(|id| *id.as_uuid()),
            occurred_at,
            event,
        }
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id.map(TraceId::from_uuid)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn reward_events_use_tagged_camel_case_json() {
        let event = DomainEvent::reward(
            UserId::new("u1").expect("valid id"),
            RewardAction::CreateComment,
        );
        assert_eq!(
            serde_json::to_value(&event).expect("encode"),
            json!({ "type": "reward", "userId": "u1", "action": "createComment" })
        );
        assert_eq!(event.queue(), QueueName::RewardEvents);
    }

    #[rstest]
    fn notifications_route_to_the_email_queue() {
        let event = DomainEvent::notification(
            EmailAddress::new("ada@example.com").expect("valid email"),
            "Profile Update",
            "Your profile has been updated",
        );
        assert_eq!(event.queue(), QueueName::EmailEvents);
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(br#"{"eventId":"00000000-0000-0000-0000-000000000000","occurredAt":"2026-01-01T00:00:00Z","event":{"type":"reward","userId":"","action":"createPost"}}"#.as_slice())]
    #[case(br#"{"eventId":"00000000-0000-0000-0000-000000000000","occurredAt":"2026-01-01T00:00:00Z","event":{"type":"levelUp"}}"#.as_slice())]
    fn decode_rejects_malformed_payloads(#[case] payload: &[u8]) {
        assert!(EventEnvelope::decode(payload).is_err());
    }

    #[tokio::test]
    async fn new_envelope_carries_scoped_trace_id() {
        let trace_id = TraceId::generate();
        let envelope = TraceId::scope(trace_id, async {
            EventEnvelope::new(
                DomainEvent::reward(UserId::new("u1").expect("valid id"), RewardAction::CreatePost),
                Utc::now(),
            )
        })
        .await;
        assert_eq!(envelope.trace_id(), Some(trace_id));
    }
}
