use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{Account, AccountId, Paste};
use crate::store::AccountStore;
use crate::App;

/// Mutations retry their whole load-modify-save cycle this many times
/// before surfacing the conflict to the caller.
const MAX_SAVE_ATTEMPTS: u32 = 3;

/// Characters of content echoed back in mutation responses.
const PREVIEW_LEN: usize = 50;

/// Truncated view of a paste returned by update and delete, so the caller
/// can confirm which record changed without re-fetching large content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastePreview {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl PastePreview {
    fn of(paste: &Paste) -> Self {
        PastePreview {
            id: paste.id.clone(),
            content: preview(&paste.content),
            created_at: paste.created_at,
        }
    }
}

/// Outcome of a mutation on a single paste.
#[derive(Debug)]
pub struct Mutation {
    pub paste: PastePreview,
    pub remaining: usize,
}

/// List the account's pastes in stored (insertion) order.
pub async fn list(app: &App, principal: &AccountId) -> ApiResult<Vec<Paste>> {
    let account = load_account(app, principal).await?;
    Ok(account.pastes)
}

/// Append a new paste and return it together with the updated collection.
pub async fn create(app: &App, principal: &AccountId, content: &str) -> ApiResult<(Paste, Vec<Paste>)> {
    if content.trim().is_empty() {
        return Err(ApiError::EmptyContent);
    }

    let (paste, account) = modify(app, principal, |account| {
        let paste = Paste::new(content.to_owned());
        account.pastes.push(paste.clone());
        Ok(paste)
    })
    .await?;

    info!(
        "new paste: account='{principal}', id='{id}', size={size}",
        id = paste.id,
        size = paste.content.len()
    );

    Ok((paste, account.pastes))
}

/// Replace a paste's content in place. Its id, creation time, and position
/// in the collection stay as they are.
pub async fn update(app: &App, principal: &AccountId, id: &str, content: &str) -> ApiResult<Mutation> {
    if content.trim().is_empty() {
        return Err(ApiError::EmptyContent);
    }

    let (paste, account) = modify(app, principal, |account| {
        let total = account.pastes.len();
        let paste = account
            .pastes
            .iter_mut()
            .find(|paste| paste.id == id)
            .ok_or_else(|| ApiError::PasteNotFound {
                requested_id: id.to_owned(),
                total_pastes: total,
            })?;

        paste.content = content.to_owned();
        Ok(PastePreview::of(paste))
    })
    .await?;

    info!("updated paste: account='{principal}', id='{id}'");

    Ok(Mutation {
        paste,
        remaining: account.pastes.len(),
    })
}

/// Remove a paste from the collection; all other entries keep their
/// relative order.
pub async fn delete(app: &App, principal: &AccountId, id: &str) -> ApiResult<Mutation> {
    let (paste, account) = modify(app, principal, |account| {
        let index = account
            .pastes
            .iter()
            .position(|paste| paste.id == id)
            .ok_or_else(|| ApiError::PasteNotFound {
                requested_id: id.to_owned(),
                total_pastes: account.pastes.len(),
            })?;

        let removed = account.pastes.remove(index);
        Ok(PastePreview::of(&removed))
    })
    .await?;

    info!("deleted paste: account='{principal}', id='{id}'");

    Ok(Mutation {
        paste,
        remaining: account.pastes.len(),
    })
}

/// Run one load-modify-save cycle for the principal's account, retrying
/// from a fresh load when the save loses a concurrent-write race. Only
/// conflicts are retried; every other failure propagates immediately.
async fn modify<T, F>(app: &App, principal: &AccountId, mut apply: F) -> ApiResult<(T, Account)>
where
    F: FnMut(&mut Account) -> ApiResult<T>,
{
    let mut attempt = 1;
    loop {
        let mut account = load_account(app, principal).await?;
        let value = apply(&mut account)?;

        match store_call(app, app.store.save_account(&account)).await {
            Ok(()) => return Ok((value, account)),
            Err(ApiError::Conflict) if attempt < MAX_SAVE_ATTEMPTS => {
                debug!("save conflict for account '{principal}' (attempt {attempt}), retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn load_account(app: &App, principal: &AccountId) -> ApiResult<Account> {
    store_call(app, app.store.load_account(principal))
        .await?
        .ok_or(ApiError::AccountNotFound)
}

/// Bound a store call by the configured timeout. Elapsing is a transient
/// failure, distinct from the account not existing.
async fn store_call<T>(app: &App, op: impl Future<Output = ApiResult<T>>) -> ApiResult<T> {
    let timeout = Duration::from_secs(app.config.database.timeout_secs);
    tokio::time::timeout(timeout, op)
        .await
        .map_err(|_| ApiError::StoreTimeout)?
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_LEN).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::memory::MemoryStore;

    const ACCOUNT: &str = "acct-1";

    async fn test_app() -> (App, AccountId) {
        let store = MemoryStore::new();
        let id = AccountId(ACCOUNT.into());
        store.insert_account(&id).await.unwrap();

        let app = App {
            config: Config::for_tests(),
            store: store.into(),
        };
        (app, id)
    }

    fn memory(app: &App) -> &MemoryStore {
        match &app.store {
            crate::store::AnyStore::Memory(store) => store,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn create_appends_to_the_collection() {
        let (app, id) = test_app().await;

        let (first, all) = create(&app, &id, "hello").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "hello");
        assert!(!first.id.is_empty());

        let (second, all) = create(&app, &id, "world").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_ne!(first.id, second.id);
        // insertion order: oldest first
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);

        let listed = list(&app, &id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "hello");
    }

    #[tokio::test]
    async fn empty_collection_lists_as_empty() {
        let (app, id) = test_app().await;
        assert!(list(&app, &id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_content_is_rejected_without_mutating() {
        let (app, id) = test_app().await;
        create(&app, &id, "keep me").await.unwrap();

        for content in ["", "   ", " \n\t "] {
            assert!(matches!(
                create(&app, &id, content).await,
                Err(ApiError::EmptyContent)
            ));
        }

        let pastes = list(&app, &id).await.unwrap();
        let paste_id = pastes[0].id.clone();
        assert!(matches!(
            update(&app, &id, &paste_id, "  ").await,
            Err(ApiError::EmptyContent)
        ));

        let after = list(&app, &id).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].content, "keep me");
    }

    #[tokio::test]
    async fn update_preserves_id_timestamp_and_position() {
        let (app, id) = test_app().await;
        let (a, _) = create(&app, &id, "a").await.unwrap();
        let (b, _) = create(&app, &id, "b").await.unwrap();
        let (c, _) = create(&app, &id, "c").await.unwrap();

        let result = update(&app, &id, &b.id, "b2").await.unwrap();
        assert_eq!(result.paste.id, b.id);
        assert_eq!(result.paste.content, "b2");
        assert_eq!(result.paste.created_at, b.created_at);
        assert_eq!(result.remaining, 3);

        let after = list(&app, &id).await.unwrap();
        let ids: Vec<_> = after.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
        assert_eq!(after[1].content, "b2");
        assert_eq!(after[1].created_at, b.created_at);
        assert_eq!(after[0].content, "a");
        assert_eq!(after[2].content, "c");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_entry() {
        let (app, id) = test_app().await;
        let (a, _) = create(&app, &id, "a").await.unwrap();
        let (b, _) = create(&app, &id, "b").await.unwrap();
        let (c, _) = create(&app, &id, "c").await.unwrap();

        let result = delete(&app, &id, &b.id).await.unwrap();
        assert_eq!(result.paste.id, b.id);
        assert_eq!(result.remaining, 2);

        let after = list(&app, &id).await.unwrap();
        let ids: Vec<_> = after.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);
    }

    #[tokio::test]
    async fn missing_paste_id_reports_diagnostics_and_leaves_state_alone() {
        let (app, id) = test_app().await;
        create(&app, &id, "only one").await.unwrap();

        let err = update(&app, &id, "nope", "new").await.unwrap_err();
        match err {
            ApiError::PasteNotFound {
                requested_id,
                total_pastes,
            } => {
                assert_eq!(requested_id, "nope");
                assert_eq!(total_pastes, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = delete(&app, &id, "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::PasteNotFound { .. }));

        let after = list(&app, &id).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].content, "only one");
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (app, _) = test_app().await;
        let stranger = AccountId("no-such-account".into());
        assert!(matches!(
            list(&app, &stranger).await,
            Err(ApiError::AccountNotFound)
        ));
        assert!(matches!(
            create(&app, &stranger, "content").await,
            Err(ApiError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn previews_are_bounded_at_fifty_chars_plus_ellipsis() {
        let (app, id) = test_app().await;
        let long = "x".repeat(60);
        let (paste, _) = create(&app, &id, &long).await.unwrap();

        let result = update(&app, &id, &paste.id, &long).await.unwrap();
        assert_eq!(result.paste.content.chars().count(), 53);
        assert!(result.paste.content.ends_with("..."));

        let exact = "y".repeat(50);
        let result = update(&app, &id, &paste.id, &exact).await.unwrap();
        assert_eq!(result.paste.content, exact);

        assert_eq!(preview("short"), "short");
        assert_eq!(preview(""), "");
    }

    #[tokio::test]
    async fn conflicting_saves_are_retried_up_to_the_budget() {
        let (app, id) = test_app().await;

        // two conflicts still leave one attempt in the budget
        memory(&app).fail_next_saves(MAX_SAVE_ATTEMPTS - 1);
        let (_, all) = create(&app, &id, "survives the race").await.unwrap();
        assert_eq!(all.len(), 1);

        // exhausting the budget surfaces the conflict
        memory(&app).fail_next_saves(MAX_SAVE_ATTEMPTS);
        assert!(matches!(
            create(&app, &id, "loses the race").await,
            Err(ApiError::Conflict)
        ));
        assert_eq!(list(&app, &id).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_surfaces_a_timeout_not_not_found() {
        let (app, id) = test_app().await;
        create(&app, &id, "written before the outage").await.unwrap();

        // stall longer than the configured store timeout
        let timeout = Duration::from_secs(app.config.database.timeout_secs);
        memory(&app).delay_ops(timeout * 2);

        assert!(matches!(
            list(&app, &id).await,
            Err(ApiError::StoreTimeout)
        ));
        assert!(matches!(
            create(&app, &id, "written during the outage").await,
            Err(ApiError::StoreTimeout)
        ));
        assert!(matches!(
            delete(&app, &id, "any-id").await,
            Err(ApiError::StoreTimeout)
        ));
    }

    #[tokio::test]
    async fn scenario_walkthrough() {
        let (app, id) = test_app().await;

        let (a, _) = create(&app, &id, "x").await.unwrap();

        let (b, all) = create(&app, &id, "y").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[1].content, "y");

        let result = update(&app, &id, &a.id, "z").await.unwrap();
        assert_eq!(result.remaining, 2);
        let after = list(&app, &id).await.unwrap();
        assert_eq!(after[0].content, "z");
        assert_eq!(after[1].content, "y");

        let result = delete(&app, &id, &a.id).await.unwrap();
        assert_eq!(result.remaining, 1);
        let after = list(&app, &id).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, b.id);

        let err = delete(&app, &id, &a.id).await.unwrap_err();
        match err {
            ApiError::PasteNotFound {
                requested_id,
                total_pastes,
            } => {
                assert_eq!(requested_id, a.id);
                assert_eq!(total_pastes, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
