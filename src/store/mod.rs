use crate::error::ApiResult;
use crate::models::{Account, AccountId};

pub mod db;
pub mod memory;

/// Durable store of accounts. Each account embeds its paste collection;
/// saves replace the whole account and are guarded by a revision check so
/// concurrent writers for the same account can't silently drop each other's
/// changes.
pub trait AccountStore {
    /// Load an account by id, or `None` if it does not exist.
    async fn load_account(&self, id: &AccountId) -> ApiResult<Option<Account>>;

    /// Replace an account's stored state. Fails with [`ApiError::Conflict`]
    /// when the stored revision no longer matches the one that was loaded.
    ///
    /// [`ApiError::Conflict`]: crate::ApiError::Conflict
    async fn save_account(&self, account: &Account) -> ApiResult<()>;

    /// Insert a fresh account with an empty paste collection.
    async fn insert_account(&self, id: &AccountId) -> ApiResult<()>;
}

#[derive(Clone)]
pub enum AnyStore {
    Db(db::DbStore),
    Memory(memory::MemoryStore),
}

impl AccountStore for AnyStore {
    async fn load_account(&self, id: &AccountId) -> ApiResult<Option<Account>> {
        match self {
            AnyStore::Db(db) => db.load_account(id).await,
            AnyStore::Memory(memory) => memory.load_account(id).await,
        }
    }

    async fn save_account(&self, account: &Account) -> ApiResult<()> {
        match self {
            AnyStore::Db(db) => db.save_account(account).await,
            AnyStore::Memory(memory) => memory.save_account(account).await,
        }
    }

    async fn insert_account(&self, id: &AccountId) -> ApiResult<()> {
        match self {
            AnyStore::Db(db) => db.insert_account(id).await,
            AnyStore::Memory(memory) => memory.insert_account(id).await,
        }
    }
}

impl From<db::DbStore> for AnyStore {
    fn from(value: db::DbStore) -> Self {
        AnyStore::Db(value)
    }
}

impl From<memory::MemoryStore> for AnyStore {
    fn from(value: memory::MemoryStore) -> Self {
        AnyStore::Memory(value)
    }
}
