//! Engagement ledger: posts, comments, likes, and the reward and
//! notification side effects they trigger.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod telemetry;

pub use domain::TraceId;
pub use middleware::Trace;
