//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use crate::Trace;
use crate::domain::{EventPublisher, InteractionPorts, InteractionService, ProfileNotifier};
use crate::outbound::memory::{InMemoryContentStore, InMemoryRewardLedger};
use crate::outbound::queue::InMemoryBroker;

use super::state::HttpState;
use super::{api_scope, json_config, query_config};

/// HTTP state wired to in-memory adapters, with handles for assertions.
pub struct TestHarness {
    pub store: InMemoryContentStore,
    pub broker: InMemoryBroker,
    pub ledger: InMemoryRewardLedger,
    pub state: HttpState,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = InMemoryContentStore::new();
        let broker = InMemoryBroker::new();
        let ledger = InMemoryRewardLedger::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()), Arc::new(DefaultClock));

        let interactions = InteractionService::new(
            InteractionPorts {
                posts: Arc::new(store.clone()),
                comments: Arc::new(store.clone()),
                likes: Arc::new(store.clone()),
            },
            publisher.clone(),
            Arc::new(DefaultClock),
        );
        let notifier = ProfileNotifier::new(Arc::new(ledger.clone()), publisher);

        Self {
            store,
            broker,
            ledger,
            state: HttpState::new(interactions, notifier),
        }
    }

    /// The full API scope as the server mounts it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .wrap(Trace)
            .service(api_scope())
    }
}

/// Attach the gateway identity header for `user`.
pub fn as_user(request: actix_web::test::TestRequest, user: &str) -> actix_web::test::TestRequest {
    request.insert_header((super::auth::USER_ID_HEADER, user.to_owned()))
}
