//! Reqwest-backed mail relay adapter.
//!
//! Submits one JSON document per message to an HTTP relay. The adapter owns
//! transport concerns only: timeouts, authentication and mapping HTTP
//! outcomes onto the retryable/permanent split the notification worker acts
//! on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::domain::ports::{MailTransport, MailTransportError, OutboundEmail};

const DEFAULT_USER_AGENT: &str = "engagement-notification-worker/0.1";

/// Sender identity and credentials for the relay.
#[derive(Debug, Clone)]
pub struct MailRelayIdentity {
    /// `from` address placed on every message.
    pub sender: String,
    /// Bearer token, when the relay requires one.
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mail transport that POSTs messages to one relay endpoint.
pub struct HttpMailTransport {
    client: Client,
    endpoint: Url,
    identity: MailRelayIdentity,
}

impl HttpMailTransport {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        identity: MailRelayIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            identity,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError> {
        let message = RelayMessage {
            from: self.identity.sender.as_str(),
            to: email.to.as_str(),
            subject: email.subject.as_str(),
            text: email.body.as_str(),
        };
        let mut request = self.client.post(self.endpoint.clone()).json(&message);
        if let Some(key) = &self.identity.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_transport_error(error: reqwest::Error) -> MailTransportError {
    if error.is_timeout() {
        MailTransportError::unavailable(format!("timed out: {error}"))
    } else {
        MailTransportError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MailTransportError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            MailTransportError::unavailable(message)
        }
        _ if status.is_client_error() => MailTransportError::rejected(message),
        _ => MailTransportError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
