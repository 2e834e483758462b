//! Mail transport that records messages in the log instead of sending them.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MailTransport, MailTransportError, OutboundEmail};

/// Used when no relay endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError> {
        info!(
            to = %email.to,
            subject = email.subject.as_str(),
            "mail relay not configured; email logged only"
        );
        Ok(())
    }
}
