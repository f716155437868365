use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an account, as carried in session token claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single text snippet owned by one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Paste {
    /// Build a paste with a fresh globally-unique id, stamped now.
    pub fn new(content: String) -> Self {
        Paste {
            id: Uuid::new_v4().to_string(),
            content,
            created_at: Utc::now(),
        }
    }
}

/// An account and its embedded, insertion-ordered paste collection.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub pastes: Vec<Paste>,
    /// Store revision of the state this was loaded from; bumped on save.
    /// Never serialized to the wire.
    pub version: i64,
}
