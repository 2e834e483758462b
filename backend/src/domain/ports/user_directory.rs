//! Port for resolving contact details of users owned by the user service.
use async_trait::async_trait;

use crate::domain::{EmailAddress, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        Connection { message: String } => "user directory connection failed: {message}",
        Query { message: String } => "user directory query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Email address on file for `user`, if the user exists and has one.
    async fn email_for(&self, user: &UserId) -> Result<Option<EmailAddress>, UserDirectoryError>;
}
