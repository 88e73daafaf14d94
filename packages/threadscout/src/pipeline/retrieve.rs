//! Fan-out retrieval across the accounts of one platform.
//!
//! One task per account, capped by a semaphore; each task returns its
//! own `Result` and the coordinator merges after awaiting all, so
//! partial-failure accounting stays explicit. No single account,
//! message fetch or credential failure ever fails the overall
//! request.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::AccountError;
use crate::traits::accounts::AccountStore;
use crate::traits::platform::{PlatformClient, PlatformQuery};
use crate::types::account::{AccountHandle, Platform};
use crate::types::config::SearchConfig;
use crate::types::message::{sort_by_recency, NormalizedMessage};

/// Retrieve and normalize messages from every account of one
/// platform.
///
/// Results come back sorted newest first, unparsable timestamps last.
/// For mail, an over-constrained query that matches nothing triggers
/// one fallback pass with the query cleared ("most recent N") so the
/// user never hits a dead end.
pub async fn retrieve<C, R>(
    client: &C,
    store: &R,
    accounts: &[AccountHandle],
    query: &PlatformQuery,
    config: &SearchConfig,
) -> Vec<NormalizedMessage>
where
    C: PlatformClient,
    R: AccountStore,
{
    let mut messages = retrieve_once(client, store, accounts, query, config).await;

    if messages.is_empty() {
        if let PlatformQuery::Mail(q) = query {
            if !q.trim().is_empty() {
                debug!(query = %q, "query matched nothing, falling back to most recent");
                let fallback = PlatformQuery::Mail(String::new());
                messages = retrieve_once(client, store, accounts, &fallback, config).await;
            }
        }
    }

    sort_by_recency(&mut messages);
    messages
}

/// One fan-out pass, without fallback or sorting.
async fn retrieve_once<C, R>(
    client: &C,
    store: &R,
    accounts: &[AccountHandle],
    query: &PlatformQuery,
    config: &SearchConfig,
) -> Vec<NormalizedMessage>
where
    C: PlatformClient,
    R: AccountStore,
{
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency));

    let tasks = accounts.iter().map(|account| {
        let semaphore = semaphore.clone();
        async move {
            let _permit = semaphore.acquire().await.unwrap();
            retrieve_account(client, account, query, config).await
        }
    });

    let results: Vec<Result<Vec<NormalizedMessage>, AccountError>> = join_all(tasks).await;

    let mut merged = Vec::new();
    for (account, result) in accounts.iter().zip(results) {
        match result {
            Ok(mut batch) => merged.append(&mut batch),
            Err(e) => {
                warn!(
                    account = %account.display_label,
                    error = %e,
                    "account retrieval failed, continuing without it"
                );
                if e.is_auth_expiry() && account.platform == Platform::Mail {
                    if let Err(inv) = store.invalidate(&account.account_id).await {
                        warn!(account = %account.display_label, error = %inv, "credential invalidation failed");
                    }
                }
            }
        }
    }

    info!(
        accounts = accounts.len(),
        messages = merged.len(),
        "fan-out retrieval complete"
    );
    merged
}

/// Retrieve one account: list, filter, fetch detail, normalize.
async fn retrieve_account<C: PlatformClient>(
    client: &C,
    account: &AccountHandle,
    query: &PlatformQuery,
    config: &SearchConfig,
) -> Result<Vec<NormalizedMessage>, AccountError> {
    let listed = client.list_recent(account, query, config.list_cap).await?;

    // Platforms without server-side search get the term filter applied
    // here, against the listing's cheap fields.
    let candidates: Vec<_> = match query {
        PlatformQuery::Terms(filter) if !filter.is_empty() => listed
            .into_iter()
            .filter(|raw| {
                filter.matches(&raw.title)
                    || filter.matches(&raw.snippet)
                    || filter.matches(&raw.sender)
            })
            .collect(),
        _ => listed,
    };

    let mut messages = Vec::new();
    for raw in candidates.into_iter().take(config.per_account_limit) {
        match client.get_detail(account, &raw.id).await {
            Ok(detail) => messages.push(detail.normalize(account, config.preview_chars)),
            Err(e) => {
                // One bad message never aborts the account
                warn!(
                    account = %account.display_label,
                    message_id = %raw.id,
                    error = %e,
                    "message fetch failed, skipping"
                );
            }
        }
    }
    Ok(messages)
}
