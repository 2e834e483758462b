//! Process-local adapters used by tests and database-less local runs.

mod content_store;
mod reward_ledger;

pub use content_store::InMemoryContentStore;
pub use reward_ledger::InMemoryRewardLedger;
