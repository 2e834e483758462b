//! In-memory users and points ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    AppendOutcome, RewardLedgerRepository, RewardLedgerRepositoryError, UserDirectory,
    UserDirectoryError,
};
use crate::domain::{EmailAddress, RewardLedgerEntry, UserId};

#[derive(Debug, Default)]
struct UserRecord {
    email: Option<EmailAddress>,
    ledger: Vec<RewardLedgerEntry>,
}

/// Process-local user mirror serving both the ledger and the directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRewardLedger {
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl InMemoryRewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update a user. Existing ledger entries are kept.
    pub fn register_user(&self, user: UserId, email: Option<EmailAddress>) {
        self.lock().entry(user).or_default().email = email;
    }

    /// Sum of all points issued to `user`.
    pub fn balance(&self, user: &UserId) -> u64 {
        self.lock().get(user).map_or(0, |record| {
            record.ledger.iter().map(|entry| u64::from(entry.amount)).sum()
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, UserRecord>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RewardLedgerRepository for InMemoryRewardLedger {
    async fn append(
        &self,
        user: &UserId,
        entry: &RewardLedgerEntry,
    ) -> Result<AppendOutcome, RewardLedgerRepositoryError> {
        Ok(match self.lock().get_mut(user) {
            Some(record) => {
                record.ledger.push(entry.clone());
                AppendOutcome::Appended
            }
            None => AppendOutcome::UnknownUser,
        })
    }

    async fn entries_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<RewardLedgerEntry>, RewardLedgerRepositoryError> {
        Ok(self
            .lock()
            .get(user)
            .map(|record| record.ledger.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for InMemoryRewardLedger {
    async fn email_for(&self, user: &UserId) -> Result<Option<EmailAddress>, UserDirectoryError> {
        Ok(self.lock().get(user).and_then(|record| record.email.clone()))
    }
}
