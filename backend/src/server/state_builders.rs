//! Builders wiring HTTP state to PostgreSQL or in-memory adapters.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::warn;

use engagement::domain::ports::{
    CommentRepository, LikeRepository, MessageBroker, PostRepository, UserDirectory,
};
use engagement::domain::{EventPublisher, InteractionPorts, InteractionService, ProfileNotifier};
use engagement::inbound::http::state::HttpState;
use engagement::outbound::memory::{InMemoryContentStore, InMemoryRewardLedger};
use engagement::outbound::persistence::{
    DieselCommentRepository, DieselLikeRepository, DieselPostRepository, DieselUserDirectory,
};
use engagement::outbound::queue::{InMemoryBroker, PostgresMessageBroker};

use super::ServerConfig;

/// Port implementations selected for one server instance.
struct Adapters {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    directory: Arc<dyn UserDirectory>,
    broker: Arc<dyn MessageBroker>,
}

fn build_adapters(config: &ServerConfig) -> Adapters {
    match &config.db_pool {
        Some(pool) => Adapters {
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            comments: Arc::new(DieselCommentRepository::new(pool.clone())),
            likes: Arc::new(DieselLikeRepository::new(pool.clone())),
            directory: Arc::new(DieselUserDirectory::new(pool.clone())),
            broker: Arc::new(PostgresMessageBroker::from_pool(pool.clone(), config.broker)),
        },
        None => {
            warn!("no database configured; content and events are held in memory");
            let store = InMemoryContentStore::new();
            Adapters {
                posts: Arc::new(store.clone()),
                comments: Arc::new(store.clone()),
                likes: Arc::new(store),
                directory: Arc::new(InMemoryRewardLedger::new()),
                broker: Arc::new(InMemoryBroker::new()),
            }
        }
    }
}

/// Construct the shared handler state from the server configuration.
pub(crate) fn build_http_state(config: &ServerConfig) -> HttpState {
    let Adapters {
        posts,
        comments,
        likes,
        directory,
        broker,
    } = build_adapters(config);

    let publisher = EventPublisher::new(broker, Arc::new(DefaultClock));
    let interactions = InteractionService::new(
        InteractionPorts {
            posts,
            comments,
            likes,
        },
        publisher.clone(),
        Arc::new(DefaultClock),
    );
    let notifier = ProfileNotifier::new(directory, publisher);
    HttpState::new(interactions, notifier)
}
