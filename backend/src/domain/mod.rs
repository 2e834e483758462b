//! Domain primitives, services, and ports for the engagement core.
//!
//! Purpose: model posts, the two-tier comment tree, like toggles, and the
//! reward/notification side effects that flow through the broker. Adapters
//! live in `outbound` and `inbound`; nothing here knows about HTTP, SQL, or
//! a concrete queue.
//!
//! Public surface:
//! - [`InteractionService`]: post/comment/like operations (synchronous path).
//! - [`EventPublisher`], [`DomainEvent`], [`EventEnvelope`]: side-effect events.
//! - [`ProfileNotifier`]: notification producer for profile edits.
//! - [`RewardWorker`], [`NotificationWorker`], [`Subscription`]: consumers.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failures.

pub mod comment;
pub mod content;
pub mod email;
pub mod error;
pub mod events;
pub mod ids;
pub mod interactions;
pub mod likes;
pub mod notifications;
pub mod pagination;
pub mod ports;
pub mod post;
pub mod rewards;
pub mod trace_id;
pub mod workers;

pub use self::comment::{ChildComment, Comment};
pub use self::content::{
    COMMENT_BODY_MAX, CommentBody, ContentValidationError, POST_BODY_MAX, POST_TITLE_MAX,
    PostContent,
};
pub use self::email::{EmailAddress, EmailValidationError};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::events::{DecodeError, DomainEvent, EventEnvelope, EventPublisher, PublishError};
pub use self::ids::{CommentId, GroupId, IdValidationError, OPAQUE_ID_MAX, PostId, UserId};
pub use self::interactions::{CreatedComment, InteractionPorts, InteractionService};
pub use self::likes::{LikeChange, LikeLedger, LikeSnapshot, LikeState, LikeTarget};
pub use self::notifications::ProfileNotifier;
pub use self::pagination::{PAGE_SIZE, Page, PageRequest};
pub use self::post::Post;
pub use self::rewards::{RewardAction, RewardLedgerEntry};
pub use self::trace_id::TraceId;
pub use self::workers::{
    HandlerOutcome, MessageHandler, NotificationWorker, PollResult, PollSleeper, RewardWorker,
    Subscription, SubscriptionConfig, TokioSleeper,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use engagement::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
