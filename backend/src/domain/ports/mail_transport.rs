//! Port for the outbound mail relay.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail transports.
    pub enum MailTransportError {
        /// Relay unreachable or temporarily failing; retry later.
        Unavailable { message: String } => "mail relay unavailable: {message}",
        /// Relay refused the message; retrying will not help.
        Rejected { message: String } => "mail relay rejected message: {message}",
    }
}

/// A message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit `email`. Success means the relay accepted it.
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError>;
}
