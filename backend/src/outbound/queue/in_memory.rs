//! Process-local `MessageBroker` for tests and single-process development.
//!
//! Messages live in per-queue FIFO buffers. A received message moves to an
//! in-flight table until it is acknowledged or requeued; requeued messages
//! go to the back of the queue. Nothing survives a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{Delivery, MessageBroker, MessageBrokerError, QueueName};

#[derive(Debug, Clone)]
struct StoredMessage {
    id: Uuid,
    payload: Vec<u8>,
    deliveries: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<Uuid, StoredMessage>,
}

/// In-memory broker with the same at-least-once contract as the durable one.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    queues: Arc<Mutex<HashMap<QueueName, QueueState>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting to be received on `queue`.
    pub fn pending(&self, queue: QueueName) -> usize {
        self.lock()
            .get(&queue)
            .map_or(0, |state| state.ready.len())
    }

    /// Messages received on `queue` but not yet acknowledged or requeued.
    pub fn in_flight(&self, queue: QueueName) -> usize {
        self.lock()
            .get(&queue)
            .map_or(0, |state| state.in_flight.len())
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueueName, QueueState>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), MessageBrokerError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(MessageBrokerError::closed())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        self.lock()
            .entry(queue)
            .or_default()
            .ready
            .push_back(StoredMessage {
                id: Uuid::new_v4(),
                payload,
                deliveries: 0,
            });
        Ok(())
    }

    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, MessageBrokerError> {
        self.ensure_open()?;
        let mut queues = self.lock();
        let state = queues.entry(queue).or_default();
        let Some(mut message) = state.ready.pop_front() else {
            return Ok(None);
        };
        message.deliveries += 1;
        let delivery = Delivery {
            id: message.id,
            queue,
            payload: message.payload.clone(),
            attempt: message.deliveries,
        };
        state.in_flight.insert(message.id, message);
        Ok(Some(delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        let mut queues = self.lock();
        let removed = queues
            .get_mut(&delivery.queue)
            .and_then(|state| state.in_flight.remove(&delivery.id));
        match removed {
            Some(_) => Ok(()),
            None => Err(MessageBrokerError::rejected(format!(
                "message {} is not in flight",
                delivery.id
            ))),
        }
    }

    async fn requeue(&self, delivery: &Delivery) -> Result<(), MessageBrokerError> {
        self.ensure_open()?;
        let mut queues = self.lock();
        let state = queues.entry(delivery.queue).or_default();
        let Some(message) = state.in_flight.remove(&delivery.id) else {
            return Err(MessageBrokerError::rejected(format!(
                "message {} is not in flight",
                delivery.id
            )));
        };
        state.ready.push_back(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn broker() -> InMemoryBroker {
        InMemoryBroker::new()
    }

    #[rstest]
    #[tokio::test]
    async fn messages_are_delivered_in_publish_order(broker: InMemoryBroker) {
        for payload in [b"a", b"b"] {
            broker
                .publish(QueueName::RewardEvents, payload.to_vec())
                .await
                .expect("publish");
        }

        let first = broker.receive(QueueName::RewardEvents).await.expect("receive");
        let second = broker.receive(QueueName::RewardEvents).await.expect("receive");
        assert_eq!(first.map(|d| d.payload), Some(b"a".to_vec()));
        assert_eq!(second.map(|d| d.payload), Some(b"b".to_vec()));
        assert_eq!(broker.in_flight(QueueName::RewardEvents), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn queues_are_isolated(broker: InMemoryBroker) {
        broker
            .publish(QueueName::EmailEvents, b"mail".to_vec())
            .await
            .expect("publish");

        assert!(broker
            .receive(QueueName::RewardEvents)
            .await
            .expect("receive")
            .is_none());
        assert_eq!(broker.pending(QueueName::EmailEvents), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn requeued_message_is_redelivered_with_next_attempt(broker: InMemoryBroker) {
        broker
            .publish(QueueName::EmailEvents, b"mail".to_vec())
            .await
            .expect("publish");
        let first = broker
            .receive(QueueName::EmailEvents)
            .await
            .expect("receive")
            .expect("message");
        broker.requeue(&first).await.expect("requeue");

        let second = broker
            .receive(QueueName::EmailEvents)
            .await
            .expect("receive")
            .expect("redelivered");
        assert_eq!(second.id, first.id);
        assert_eq!(second.attempt, 2);

        broker.ack(&second).await.expect("ack");
        assert_eq!(broker.pending(QueueName::EmailEvents), 0);
        assert_eq!(broker.in_flight(QueueName::EmailEvents), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn double_ack_is_rejected(broker: InMemoryBroker) {
        broker
            .publish(QueueName::RewardEvents, b"x".to_vec())
            .await
            .expect("publish");
        let delivery = broker
            .receive(QueueName::RewardEvents)
            .await
            .expect("receive")
            .expect("message");
        broker.ack(&delivery).await.expect("first ack");

        let err = broker.ack(&delivery).await.expect_err("second ack");
        assert!(matches!(err, MessageBrokerError::Rejected { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn closed_broker_refuses_work(broker: InMemoryBroker) {
        broker.close();
        let err = broker
            .publish(QueueName::RewardEvents, Vec::new())
            .await
            .expect_err("closed");
        assert_eq!(err, MessageBrokerError::Closed);
    }
}
