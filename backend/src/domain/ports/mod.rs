//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod comment_repository;
mod like_repository;
mod mail_transport;
mod message_broker;
mod post_repository;
mod reward_ledger_repository;
mod user_directory;

#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use like_repository::MockLikeRepository;
pub use like_repository::{LikeRepository, LikeRepositoryError};
#[cfg(test)]
pub use mail_transport::MockMailTransport;
pub use mail_transport::{MailTransport, MailTransportError, OutboundEmail};
#[cfg(test)]
pub use message_broker::MockMessageBroker;
pub use message_broker::{Delivery, MessageBroker, MessageBrokerError, QueueName, UnknownQueue};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use reward_ledger_repository::MockRewardLedgerRepository;
pub use reward_ledger_repository::{
    AppendOutcome, RewardLedgerRepository, RewardLedgerRepositoryError,
};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
