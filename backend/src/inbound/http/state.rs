//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and depend only on domain services,
//! so they stay testable without I/O.

use crate::domain::{InteractionService, ProfileNotifier};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub interactions: InteractionService,
    pub notifier: ProfileNotifier,
}

impl HttpState {
    pub fn new(interactions: InteractionService, notifier: ProfileNotifier) -> Self {
        Self {
            interactions,
            notifier,
        }
    }
}
