//! Port for the durable named-queue broker.
//!
//! Delivery is at least once: a message stays owned by the broker until the
//! consumer acknowledges it, and an unacknowledged message is redelivered
//! after [`MessageBroker::requeue`] or once the consumer's claim lapses.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by broker adapters.
    pub enum MessageBrokerError {
        /// The broker could not be reached.
        Unavailable { message: String } => "message broker unavailable: {message}",
        /// The broker refused or failed the operation.
        Rejected { message: String } => "message broker rejected operation: {message}",
        /// The broker was closed by its owner.
        Closed => "message broker is closed",
    }
}

/// Durable queues shared by the API and the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    /// Consumed by the reward worker.
    RewardEvents,
    /// Consumed by the notification worker.
    EmailEvents,
}

impl QueueName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RewardEvents => "reward-events",
            Self::EmailEvents => "email-events",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown queue name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown queue: {0}")]
pub struct UnknownQueue(pub String);

impl FromStr for QueueName {
    type Err = UnknownQueue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reward-events" => Ok(Self::RewardEvents),
            "email-events" => Ok(Self::EmailEvents),
            other => Err(UnknownQueue(other.to_owned())),
        }
    }
}

/// A message claimed by one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: Uuid,
    pub queue: QueueName,
    pub payload: Vec<u8>,
    /// 1 on first delivery, incremented on each redelivery.
    pub attempt: u32,
}

/// Named-queue publish/consume primitive with manual acknowledgement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Durably enqueue `payload`. Returns once the broker has accepted it.
    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), MessageBrokerError>;

    /// Claim the next available message on `queue`, if any.
    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, MessageBrokerError>;

    /// Remove a processed message permanently.
    async fn ack(&self, delivery: &Delivery) -> Result<(), MessageBrokerError>;

    /// Release a claimed message for redelivery.
    async fn requeue(&self, delivery: &Delivery) -> Result<(), MessageBrokerError>;
}
