//! Outbound mail transports.

mod http_transport;
mod log_transport;

pub use http_transport::{HttpMailTransport, MailRelayIdentity};
pub use log_transport::LogMailTransport;
