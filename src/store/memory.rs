use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::models::{Account, AccountId};

use super::AccountStore;

/// In-memory account store for tests and local development. Does NOT
/// persist data, but enforces the same revision check as the database
/// store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    fail_saves: u32,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` saves report a conflict, to exercise the
    /// load-modify-save retry path.
    pub fn fail_next_saves(&self, count: u32) {
        self.inner.lock().unwrap().fail_saves = count;
    }

    /// Stall every following load and save by `delay`, to exercise the
    /// store-timeout path.
    pub fn delay_ops(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }

    async fn stall(&self) {
        let delay = self.inner.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl AccountStore for MemoryStore {
    async fn load_account(&self, id: &AccountId) -> ApiResult<Option<Account>> {
        self.stall().await;

        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.get(id).cloned())
    }

    async fn save_account(&self, account: &Account) -> ApiResult<()> {
        self.stall().await;

        let mut inner = self.inner.lock().unwrap();

        if inner.fail_saves > 0 {
            inner.fail_saves -= 1;
            return Err(ApiError::Conflict);
        }

        match inner.accounts.get_mut(&account.id) {
            Some(stored) if stored.version == account.version => {
                *stored = Account {
                    version: account.version + 1,
                    ..account.clone()
                };
                Ok(())
            }
            // the account changed (or vanished) since it was loaded
            _ => Err(ApiError::Conflict),
        }
    }

    async fn insert_account(&self, id: &AccountId) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();

        if inner.accounts.contains_key(id) {
            return Err(ApiError::Conflict);
        }

        inner.accounts.insert(
            id.clone(),
            Account {
                id: id.clone(),
                pastes: Vec::new(),
                version: 0,
            },
        );
        Ok(())
    }
}
