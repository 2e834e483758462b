//! `PostgresMessageBroker` against embedded PostgreSQL.
//!
//! Lease expiry is simulated by rewinding `locked_until` so the tests never
//! sleep on wall-clock time.

use std::time::Duration;

use engagement::domain::ports::{Delivery, MessageBroker, QueueName};
use engagement::outbound::queue::{PostgresBrokerConfig, PostgresMessageBroker};
use rstest::{fixture, rstest};

mod support;

use support::{TestDatabase, database_or_skip};

struct Context {
    db: TestDatabase,
    broker: PostgresMessageBroker,
}

impl Context {
    fn publish(&self, queue: QueueName, payload: &[u8]) {
        self.db
            .runtime
            .block_on(self.broker.publish(queue, payload.to_vec()))
            .expect("publish");
    }

    fn receive(&self, queue: QueueName) -> Option<Delivery> {
        self.db
            .runtime
            .block_on(self.broker.receive(queue))
            .expect("receive")
    }

    fn expire_leases(&self) {
        self.db.execute(
            "UPDATE queue_messages SET locked_until = now() - interval '1 second' \
             WHERE locked_until IS NOT NULL",
        );
    }

    fn stored_messages(&self) -> i64 {
        self.db.scalar("SELECT count(*) AS value FROM queue_messages")
    }
}

#[fixture]
fn context() -> Option<Context> {
    let db = database_or_skip(4)?;
    let broker = PostgresMessageBroker::from_pool(
        db.pool.clone(),
        PostgresBrokerConfig {
            lease: Duration::from_secs(60),
            requeue_delay: Duration::ZERO,
        },
    );
    Some(Context { db, broker })
}

#[rstest]
fn claimed_message_is_hidden_until_acknowledged(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: claimed_message_is_hidden_until_acknowledged skipped");
        return;
    };
    ctx.publish(QueueName::RewardEvents, b"first");

    let delivery = ctx.receive(QueueName::RewardEvents).expect("message ready");
    assert_eq!(delivery.payload, b"first");
    assert_eq!(delivery.attempt, 1);
    assert_eq!(ctx.receive(QueueName::RewardEvents), None);
    assert_eq!(ctx.receive(QueueName::EmailEvents), None);

    ctx.db
        .runtime
        .block_on(ctx.broker.ack(&delivery))
        .expect("ack");
    assert_eq!(ctx.stored_messages(), 0);
}

#[rstest]
fn requeued_message_is_redelivered_with_next_attempt(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: requeued_message_is_redelivered_with_next_attempt skipped");
        return;
    };
    ctx.publish(QueueName::EmailEvents, b"mail");

    let first = ctx.receive(QueueName::EmailEvents).expect("message ready");
    ctx.db
        .runtime
        .block_on(ctx.broker.requeue(&first))
        .expect("requeue");

    let second = ctx.receive(QueueName::EmailEvents).expect("redelivered");
    assert_eq!(second.id, first.id);
    assert_eq!(second.attempt, 2);
    assert_eq!(ctx.stored_messages(), 1);
}

#[rstest]
fn expired_lease_makes_message_visible_again(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: expired_lease_makes_message_visible_again skipped");
        return;
    };
    ctx.publish(QueueName::RewardEvents, b"crashy");

    let abandoned = ctx.receive(QueueName::RewardEvents).expect("message ready");
    assert_eq!(ctx.receive(QueueName::RewardEvents), None);

    ctx.expire_leases();
    let reclaimed = ctx.receive(QueueName::RewardEvents).expect("lease lapsed");
    assert_eq!(reclaimed.id, abandoned.id);
    assert_eq!(reclaimed.attempt, 2);
}

#[rstest]
fn stale_consumer_cannot_settle_a_reclaimed_message(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: stale_consumer_cannot_settle_a_reclaimed_message skipped");
        return;
    };
    ctx.publish(QueueName::RewardEvents, b"contended");
    let stale = ctx.receive(QueueName::RewardEvents).expect("message ready");
    ctx.expire_leases();
    let current = ctx.receive(QueueName::RewardEvents).expect("reclaimed");
    let rt = &ctx.db.runtime;

    rt.block_on(ctx.broker.requeue(&stale)).expect("stale requeue");
    assert_eq!(
        ctx.receive(QueueName::RewardEvents),
        None,
        "current claim still holds the lease"
    );

    rt.block_on(ctx.broker.ack(&stale)).expect("stale ack");
    assert_eq!(ctx.stored_messages(), 1);

    rt.block_on(ctx.broker.ack(&current)).expect("ack");
    assert_eq!(ctx.stored_messages(), 0);
}

#[rstest]
fn messages_are_claimed_oldest_first(context: Option<Context>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: messages_are_claimed_oldest_first skipped");
        return;
    };
    for payload in [b"one", b"two", b"six"] {
        ctx.publish(QueueName::RewardEvents, payload);
    }

    let order: Vec<Vec<u8>> = std::iter::from_fn(|| ctx.receive(QueueName::RewardEvents))
        .map(|delivery| delivery.payload)
        .collect();
    assert_eq!(order, [b"one".to_vec(), b"two".to_vec(), b"six".to_vec()]);
}
