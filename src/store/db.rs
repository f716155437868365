use sqlx::{AnyPool, Row};

use crate::error::{ApiError, ApiResult};
use crate::models::{Account, AccountId, Paste};

use super::AccountStore;

#[derive(Clone)]
pub struct DbStore {
    pool: AnyPool,
}

impl DbStore {
    /// Connect to a database by URL and make sure the schema exists.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = AnyPool::connect(url).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS account (
                 id TEXT PRIMARY KEY,
                 pastes TEXT NOT NULL DEFAULT '[]',
                 version BIGINT NOT NULL DEFAULT 0
             )",
        )
        .execute(&pool)
        .await?;

        Ok(DbStore { pool })
    }
}

impl AccountStore for DbStore {
    async fn load_account(&self, id: &AccountId) -> ApiResult<Option<Account>> {
        let row = sqlx::query("SELECT pastes, version FROM account WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };

        // rows written before any paste existed may carry an empty column
        let raw: Option<String> = row.try_get("pastes")?;
        let pastes: Vec<Paste> = match raw.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw)?,
        };

        Ok(Some(Account {
            id: id.clone(),
            pastes,
            version: row.try_get("version")?,
        }))
    }

    async fn save_account(&self, account: &Account) -> ApiResult<()> {
        let pastes = serde_json::to_string(&account.pastes)?;

        let result = sqlx::query(
            "UPDATE account SET pastes = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(&pastes)
        .bind(&account.id.0)
        .bind(account.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict);
        }

        Ok(())
    }

    async fn insert_account(&self, id: &AccountId) -> ApiResult<()> {
        let result = sqlx::query("INSERT INTO account (id) VALUES (?) ON CONFLICT (id) DO NOTHING")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        // same contract as a lost revision check: the id is already taken
        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict);
        }

        Ok(())
    }
}
