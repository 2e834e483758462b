//! Sends email for `email-events` messages.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::TraceId;
use crate::domain::events::DomainEvent;
use crate::domain::ports::{
    Delivery, MailTransport, MailTransportError, OutboundEmail, QueueName,
};

use super::{HandlerOutcome, MessageHandler, decode_delivery};

/// Consumer of notification events.
///
/// A message is acknowledged only after the relay accepted it. Redelivery
/// after a lost acknowledgement sends the email again.
pub struct NotificationWorker {
    transport: Arc<dyn MailTransport>,
}

impl NotificationWorker {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    async fn dispatch(&self, email: OutboundEmail, attempt: u32) -> HandlerOutcome {
        match self.transport.send(&email).await {
            Ok(()) => {
                info!(recipient = %email.to, subject = %email.subject, "notification sent");
                HandlerOutcome::Ack
            }
            Err(MailTransportError::Unavailable { message }) => {
                warn!(recipient = %email.to, attempt, %message, "mail relay unavailable; requeueing");
                HandlerOutcome::Requeue
            }
            Err(MailTransportError::Rejected { message }) => {
                error!(recipient = %email.to, %message, "mail relay rejected notification; discarding");
                HandlerOutcome::Ack
            }
        }
    }
}

#[async_trait]
impl MessageHandler for NotificationWorker {
    fn queue(&self) -> QueueName {
        QueueName::EmailEvents
    }

    async fn handle(&self, delivery: &Delivery) -> HandlerOutcome {
        let Some(envelope) = decode_delivery(delivery) else {
            return HandlerOutcome::Ack;
        };
        let trace_id = envelope.trace_id();
        let DomainEvent::Notification {
            recipient,
            subject,
            body,
        } = envelope.event
        else {
            error!(
                delivery_id = %delivery.id,
                event_id = %envelope.event_id,
                "unexpected event on email queue; discarding"
            );
            return HandlerOutcome::Ack;
        };

        let email = OutboundEmail {
            to: recipient,
            subject,
            body,
        };
        TraceId::scope_optional(trace_id, self.dispatch(email, delivery.attempt)).await
    }
}
