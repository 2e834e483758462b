//! Receive → handle → ack/requeue loop bound to one queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt as _;
use tracing::{debug, info, warn};

use crate::domain::ports::{MessageBroker, MessageBrokerError};

use super::{HandlerOutcome, MessageHandler, PollSleeper, TokioSleeper};

/// Subscription loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Pause after an empty poll, a requeue, or a broker failure.
    pub poll_interval: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    Idle,
    Acked,
    Requeued,
}

/// Binds a [`MessageHandler`] to its queue on a broker.
pub struct Subscription {
    broker: Arc<dyn MessageBroker>,
    handler: Arc<dyn MessageHandler>,
    sleeper: Arc<dyn PollSleeper>,
    config: SubscriptionConfig,
}

impl Subscription {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn MessageHandler>,
        config: SubscriptionConfig,
    ) -> Self {
        Self::with_sleeper(broker, handler, Arc::new(TokioSleeper), config)
    }

    pub fn with_sleeper(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn MessageHandler>,
        sleeper: Arc<dyn PollSleeper>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            broker,
            handler,
            sleeper,
            config,
        }
    }

    /// Claim at most one message and settle it according to the handler.
    ///
    /// A failed ack leaves the message claimed; the broker redelivers it
    /// once the claim lapses.
    pub async fn process_next(&self) -> Result<PollResult, MessageBrokerError> {
        let queue = self.handler.queue();
        let Some(delivery) = self.broker.receive(queue).await? else {
            return Ok(PollResult::Idle);
        };
        debug!(%queue, delivery_id = %delivery.id, attempt = delivery.attempt, "message received");

        match self.handler.handle(&delivery).await {
            HandlerOutcome::Ack => {
                self.broker.ack(&delivery).await?;
                Ok(PollResult::Acked)
            }
            HandlerOutcome::Requeue => {
                self.broker.requeue(&delivery).await?;
                debug!(%queue, delivery_id = %delivery.id, "message requeued");
                Ok(PollResult::Requeued)
            }
        }
    }

    /// Poll until `shutdown` resolves or the broker is closed.
    ///
    /// Shutdown is observed between messages, never while one is being
    /// handled.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()> + Send,
    {
        let queue = self.handler.queue();
        info!(%queue, "subscription started");
        tokio::pin!(shutdown);

        loop {
            let pause = match self.process_next().await {
                Ok(PollResult::Acked) => false,
                Ok(PollResult::Idle | PollResult::Requeued) => true,
                Err(MessageBrokerError::Closed) => {
                    info!(%queue, "broker closed; subscription stopping");
                    break;
                }
                Err(error) => {
                    warn!(%queue, %error, "broker operation failed; backing off");
                    true
                }
            };

            if pause {
                tokio::select! {
                    () = &mut shutdown => break,
                    () = self.sleeper.sleep(self.config.poll_interval) => {}
                }
            } else if shutdown.as_mut().now_or_never().is_some() {
                break;
            }
        }
        info!(%queue, "subscription stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::ports::{Delivery, MockMessageBroker, QueueName};
    use async_trait::async_trait;
    use uuid::Uuid;

    struct ScriptedHandler {
        outcome: HandlerOutcome,
        seen: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl MessageHandler for ScriptedHandler {
        fn queue(&self) -> QueueName {
            QueueName::RewardEvents
        }

        async fn handle(&self, delivery: &Delivery) -> HandlerOutcome {
            self.seen.lock().expect("seen lock").push(delivery.id);
            self.outcome
        }
    }

    #[derive(Default)]
    struct NoopSleeper;

    #[async_trait]
    impl PollSleeper for NoopSleeper {
        async fn sleep(&self, _duration: Duration) {
            tokio::task::yield_now().await;
        }
    }

    fn delivery() -> Delivery {
        Delivery {
            id: Uuid::new_v4(),
            queue: QueueName::RewardEvents,
            payload: b"{}".to_vec(),
            attempt: 1,
        }
    }

    fn subscription(broker: MockMessageBroker, outcome: HandlerOutcome) -> Subscription {
        Subscription::with_sleeper(
            Arc::new(broker),
            Arc::new(ScriptedHandler {
                outcome,
                seen: Mutex::new(Vec::new()),
            }),
            Arc::new(NoopSleeper),
            SubscriptionConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_queue_is_idle() {
        let mut broker = MockMessageBroker::new();
        broker
            .expect_receive()
            .withf(|queue| *queue == QueueName::RewardEvents)
            .return_once(|_| Ok(None));

        let result = subscription(broker, HandlerOutcome::Ack).process_next().await;
        assert_eq!(result, Ok(PollResult::Idle));
    }

    #[tokio::test]
    async fn ack_outcome_acknowledges_delivery() {
        let message = delivery();
        let expected_id = message.id;
        let mut broker = MockMessageBroker::new();
        broker.expect_receive().return_once(move |_| Ok(Some(message)));
        broker
            .expect_ack()
            .withf(move |delivery| delivery.id == expected_id)
            .times(1)
            .return_once(|_| Ok(()));
        broker.expect_requeue().never();

        let result = subscription(broker, HandlerOutcome::Ack).process_next().await;
        assert_eq!(result, Ok(PollResult::Acked));
    }

    #[tokio::test]
    async fn requeue_outcome_releases_delivery() {
        let message = delivery();
        let mut broker = MockMessageBroker::new();
        broker.expect_receive().return_once(move |_| Ok(Some(message)));
        broker.expect_ack().never();
        broker.expect_requeue().times(1).return_once(|_| Ok(()));

        let result = subscription(broker, HandlerOutcome::Requeue).process_next().await;
        assert_eq!(result, Ok(PollResult::Requeued));
    }

    #[tokio::test]
    async fn run_stops_when_broker_closes() {
        let mut broker = MockMessageBroker::new();
        let mut polls = 0;
        broker.expect_receive().times(2).returning(move |_| {
            polls += 1;
            if polls == 1 {
                Err(MessageBrokerError::unavailable("reconnecting"))
            } else {
                Err(MessageBrokerError::closed())
            }
        });

        subscription(broker, HandlerOutcome::Ack)
            .run(std::future::pending())
            .await;
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let mut broker = MockMessageBroker::new();
        broker.expect_receive().returning(|_| Ok(None));

        subscription(broker, HandlerOutcome::Ack)
            .run(async {})
            .await;
    }
}
