//! End-to-end behaviour of the engagement core on in-memory adapters:
//! interaction service → broker → reward and notification workers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use engagement::domain::ports::{
    MailTransport, MailTransportError, MessageBroker, OutboundEmail, QueueName,
};
use engagement::domain::{
    CommentBody, CreatedComment, EmailAddress, ErrorCode, EventPublisher, HandlerOutcome,
    InteractionPorts, InteractionService, LikeTarget, MessageHandler, NotificationWorker,
    PageRequest, PollResult, PostContent, PostId, ProfileNotifier, RewardWorker, Subscription,
    SubscriptionConfig, UserId,
};
use engagement::outbound::memory::{InMemoryContentStore, InMemoryRewardLedger};
use engagement::outbound::queue::InMemoryBroker;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

struct World {
    service: InteractionService,
    notifier: ProfileNotifier,
    broker: InMemoryBroker,
    ledger: InMemoryRewardLedger,
}

#[fixture]
fn world() -> World {
    let store = InMemoryContentStore::new();
    let broker = InMemoryBroker::new();
    let ledger = InMemoryRewardLedger::new();
    let publisher = EventPublisher::new(Arc::new(broker.clone()), Arc::new(DefaultClock));
    let service = InteractionService::new(
        InteractionPorts {
            posts: Arc::new(store.clone()),
            comments: Arc::new(store.clone()),
            likes: Arc::new(store),
        },
        publisher.clone(),
        Arc::new(DefaultClock),
    );
    let notifier = ProfileNotifier::new(Arc::new(ledger.clone()), publisher);
    World {
        service,
        notifier,
        broker,
        ledger,
    }
}

fn user(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

async fn new_post(world: &World, author: &UserId) -> PostId {
    world
        .service
        .create_post(
            author,
            PostContent::new("title", "body").expect("valid content"),
            None,
        )
        .await
        .expect("post created")
        .id
}

#[rstest]
#[tokio::test]
async fn toggle_parity_decides_final_state(world: World) {
    let author = user("author");
    let fan = user("fan");
    let target = LikeTarget::Post(new_post(&world, &author).await);

    for round in 1..=5_u32 {
        let snapshot = world
            .service
            .toggle_like(&fan, &target)
            .await
            .expect("toggle succeeds");
        let odd = round % 2 == 1;
        assert_eq!(snapshot.liked, odd);
        assert_eq!(snapshot.like_count, u32::from(odd));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likers_are_all_counted(world: World) {
    let author = user("author");
    let post = new_post(&world, &author).await;
    let target = LikeTarget::Post(post);

    let tasks: Vec<_> = (0..32)
        .map(|n| {
            let service = world.service.clone();
            tokio::spawn(async move {
                service
                    .like(&user(&format!("liker-{n}")), &target)
                    .await
                    .expect("like succeeds")
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("task completes");
    }

    let post = world
        .service
        .get_post(&author, &post)
        .await
        .expect("post exists");
    assert_eq!(post.likes.count(), 32);
    assert_eq!(post.likes.likers().len(), 32);
}

#[rstest]
#[tokio::test]
async fn only_top_level_comments_move_the_counter(world: World) {
    let author = user("author");
    let post = new_post(&world, &author).await;
    let body = || CommentBody::new("nice").expect("valid body");

    let created = world
        .service
        .create_comment(&author, &post, body(), None)
        .await
        .expect("comment created");
    let CreatedComment::TopLevel(top) = created else {
        panic!("expected a top-level comment");
    };
    world
        .service
        .create_comment(&author, &post, body(), Some(top.id))
        .await
        .expect("reply created");

    let fetched = world.service.get_post(&author, &post).await.expect("post");
    assert_eq!(fetched.comment_count, 1);

    world
        .service
        .delete_comment(&author, &top.id, None)
        .await
        .expect("comment deleted");
    let fetched = world.service.get_post(&author, &post).await.expect("post");
    assert_eq!(fetched.comment_count, 0);

    let err = world
        .service
        .delete_comment(&author, &top.id, None)
        .await
        .expect_err("already gone");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let page = world
        .service
        .get_comments(&author, &post, PageRequest::new(0))
        .await
        .expect("comments listed");
    assert!(page.items.is_empty());
}

#[rstest]
#[tokio::test]
async fn reward_worker_credits_points_for_a_new_post(world: World) {
    let author = user("author");
    world.ledger.register_user(author.clone(), None);
    new_post(&world, &author).await;

    let subscription = Subscription::new(
        Arc::new(world.broker.clone()),
        Arc::new(RewardWorker::new(
            Arc::new(world.ledger.clone()),
            Arc::new(DefaultClock),
        )),
        SubscriptionConfig::default(),
    );
    let outcome = subscription
        .process_next()
        .await
        .expect("broker reachable");

    assert_eq!(outcome, PollResult::Acked);
    assert_eq!(world.ledger.balance(&author), 5);
    assert_eq!(world.broker.pending(QueueName::RewardEvents), 0);
    assert_eq!(world.broker.in_flight(QueueName::RewardEvents), 0);
}

#[rstest]
#[tokio::test]
async fn redelivery_after_a_lost_ack_duplicates_the_entry(world: World) {
    let author = user("author");
    world.ledger.register_user(author.clone(), None);
    new_post(&world, &author).await;

    let worker = RewardWorker::new(Arc::new(world.ledger.clone()), Arc::new(DefaultClock));
    let delivery = world
        .broker
        .receive(QueueName::RewardEvents)
        .await
        .expect("broker reachable")
        .expect("reward queued");

    assert_eq!(worker.handle(&delivery).await, HandlerOutcome::Ack);
    assert_eq!(worker.handle(&delivery).await, HandlerOutcome::Ack);
    assert_eq!(world.ledger.balance(&author), 10);
}

/// Fails the first `failures` sends, then records every accepted message.
struct FlakyRelay {
    failures: AtomicU32,
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl MailTransport for FlakyRelay {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(MailTransportError::unavailable("relay warming up"));
        }
        self.sent.lock().expect("sent lock").push(email.clone());
        Ok(())
    }
}

#[rstest]
#[tokio::test]
async fn failed_mail_is_retried_and_sent_exactly_once(world: World) {
    let member = user("member");
    world.ledger.register_user(
        member.clone(),
        Some(EmailAddress::new("member@example.com").expect("valid email")),
    );
    world
        .notifier
        .profile_updated(&member)
        .await
        .expect("notification queued");

    let relay = Arc::new(FlakyRelay {
        failures: AtomicU32::new(1),
        sent: Mutex::new(Vec::new()),
    });
    let subscription = Subscription::new(
        Arc::new(world.broker.clone()),
        Arc::new(NotificationWorker::new(relay.clone())),
        SubscriptionConfig::default(),
    );

    for expected in [PollResult::Requeued, PollResult::Acked, PollResult::Idle] {
        assert_eq!(
            subscription.process_next().await.expect("broker reachable"),
            expected
        );
    }

    let sent = relay.sent.lock().expect("sent lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "member@example.com");
    assert_eq!(sent[0].subject, "Profile Update");
}
