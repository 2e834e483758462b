//! Queue consumers for deferred side effects.
//!
//! Each worker implements [`MessageHandler`] for exactly one queue and is
//! driven by a [`Subscription`] loop. Handlers decide whether a delivery is
//! acknowledged or requeued; they never talk to the interaction store.

mod notification_worker;
mod reward_worker;
mod subscription;

pub use notification_worker::NotificationWorker;
pub use reward_worker::RewardWorker;
pub use subscription::{PollResult, Subscription, SubscriptionConfig};

use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use super::events::EventEnvelope;
use super::ports::{Delivery, QueueName};

/// Decision taken by a handler for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Processing finished (or can never succeed); remove the message.
    Ack,
    /// Processing failed transiently; make the message available again.
    Requeue,
}

/// Consumer of one queue.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Queue this handler consumes.
    fn queue(&self) -> QueueName;

    /// Apply the side effect carried by `delivery`.
    async fn handle(&self, delivery: &Delivery) -> HandlerOutcome;
}

/// Async sleep used between empty polls.
#[async_trait]
pub trait PollSleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl PollSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Decode a delivery, logging payloads that can never be processed.
fn decode_delivery(delivery: &Delivery) -> Option<EventEnvelope> {
    match EventEnvelope::decode(&delivery.payload) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            error!(
                queue = %delivery.queue,
                delivery_id = %delivery.id,
                attempt = delivery.attempt,
                error = %err,
                "discarding undecodable message"
            );
            None
        }
    }
}
