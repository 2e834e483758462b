//! Producer of account notification emails.

use std::sync::Arc;

use tracing::info;

use super::events::{DomainEvent, EventPublisher};
use super::ports::{UserDirectory, UserDirectoryError};
use super::{Error, UserId};

pub const PROFILE_UPDATE_SUBJECT: &str = "Profile Update";
pub const PROFILE_UPDATE_BODY: &str = "Your profile has been updated";

/// Queues notification emails for account events owned by the user service.
#[derive(Clone)]
pub struct ProfileNotifier {
    directory: Arc<dyn UserDirectory>,
    publisher: EventPublisher,
}

impl ProfileNotifier {
    pub fn new(directory: Arc<dyn UserDirectory>, publisher: EventPublisher) -> Self {
        Self {
            directory,
            publisher,
        }
    }

    /// Queue the "profile updated" email for `user`.
    ///
    /// Users without an address on file are skipped. Publishing is best
    /// effort; only a failed directory lookup is returned.
    pub async fn profile_updated(&self, user: &UserId) -> Result<(), Error> {
        let email = self
            .directory
            .email_for(user)
            .await
            .map_err(map_directory_error)?;
        let Some(recipient) = email else {
            info!(user_id = %user, "no email on file; profile notification skipped");
            return Ok(());
        };

        self.publisher
            .publish_best_effort(DomainEvent::notification(
                recipient,
                PROFILE_UPDATE_SUBJECT,
                PROFILE_UPDATE_BODY,
            ))
            .await;
        Ok(())
    }
}

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}
