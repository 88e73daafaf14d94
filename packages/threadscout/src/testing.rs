//! Testing utilities including mock implementations.
//!
//! Useful for testing applications built on this library without real
//! platform or language-backend calls. All mocks record their calls
//! for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{AccountError, AccountResult, LanguageError, LanguageResult};
use crate::traits::accounts::AccountStore;
use crate::traits::language::LanguageBackend;
use crate::traits::platform::{PlatformClient, PlatformQuery, RawMessage, RawMessageDetail};
use crate::types::account::AccountHandle;

/// A scripted language backend.
///
/// Replies are matched by substring against the user prompt, first
/// match wins. Unmatched prompts get the default reply (empty string
/// unless configured), which downstream parsing treats as "nothing
/// extracted".
/// Clones share scripted replies and recorded calls, so a clone moved
/// into a [`crate::Searcher`] can still be asserted on afterwards.
#[derive(Clone, Default)]
pub struct MockLanguage {
    replies: Arc<RwLock<Vec<ScriptedReply>>>,
    default_reply: Arc<RwLock<String>>,
    fail: bool,
    calls: Arc<RwLock<Vec<MockLanguageCall>>>,
}

struct ScriptedReply {
    needle: String,
    reply: String,
    delay: Option<Duration>,
}

/// Record of one completion call.
#[derive(Debug, Clone)]
pub struct MockLanguageCall {
    /// The system prompt used
    pub system: String,
    /// The user prompt used
    pub user: String,
}

impl MockLanguage {
    /// Create a mock that answers every prompt with the default reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Script a reply for prompts containing `needle`.
    pub fn with_reply(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.replies.write().unwrap().push(ScriptedReply {
            needle: needle.into(),
            reply: reply.into(),
            delay: None,
        });
        self
    }

    /// Script a reply that arrives only after `delay_ms`.
    pub fn with_delayed_reply(
        self,
        needle: impl Into<String>,
        reply: impl Into<String>,
        delay_ms: u64,
    ) -> Self {
        self.replies.write().unwrap().push(ScriptedReply {
            needle: needle.into(),
            reply: reply.into(),
            delay: Some(Duration::from_millis(delay_ms)),
        });
        self
    }

    /// Set the reply for unmatched prompts.
    pub fn with_default_reply(self, reply: impl Into<String>) -> Self {
        *self.default_reply.write().unwrap() = reply.into();
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<MockLanguageCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl LanguageBackend for MockLanguage {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> LanguageResult<String> {
        self.calls.write().unwrap().push(MockLanguageCall {
            system: system.to_string(),
            user: user.to_string(),
        });

        if self.fail {
            return Err(LanguageError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock connection refused",
            ))));
        }

        let matched = {
            let replies = self.replies.read().unwrap();
            replies
                .iter()
                .find(|r| user.contains(&r.needle))
                .map(|r| (r.reply.clone(), r.delay))
        };

        match matched {
            Some((reply, delay)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(reply)
            }
            None => Ok(self.default_reply.read().unwrap().clone()),
        }
    }
}

/// A scripted platform client.
///
/// Holds full message details per account; listings are derived from
/// them. A naive contains-filter emulates mail server-side search so
/// fallback behavior is exercisable: a non-empty query matches a
/// message when any non-clause token occurs in its title or body.
/// Clones share message state and recorded calls.
#[derive(Clone, Default)]
pub struct MockPlatform {
    messages: Arc<RwLock<HashMap<String, Vec<RawMessageDetail>>>>,
    snippets: Arc<RwLock<HashMap<String, String>>>,
    auth_failures: Arc<RwLock<Vec<String>>>,
    detail_failures: Arc<RwLock<Vec<String>>>,
    calls: Arc<RwLock<Vec<MockPlatformCall>>>,
}

/// Record of one platform call.
#[derive(Debug, Clone)]
pub enum MockPlatformCall {
    /// A list/search call
    List {
        /// Account queried
        account_id: String,
        /// Listing cap passed
        limit: usize,
        /// Whether the query was unfiltered
        unfiltered: bool,
    },
    /// A detail fetch
    Detail {
        /// Account queried
        account_id: String,
        /// Message fetched
        message_id: String,
    },
}

impl MockPlatform {
    /// Create an empty mock platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to an account, in arrival order.
    pub fn with_message(self, account_id: impl Into<String>, detail: RawMessageDetail) -> Self {
        self.messages
            .write()
            .unwrap()
            .entry(account_id.into())
            .or_default()
            .push(detail);
        self
    }

    /// Override the listing snippet for one message.
    ///
    /// By default the snippet is the full decoded body, so short
    /// bodies exercise the tiered full-fetch path.
    pub fn with_snippet(self, message_id: impl Into<String>, snippet: impl Into<String>) -> Self {
        self.snippets
            .write()
            .unwrap()
            .insert(message_id.into(), snippet.into());
        self
    }

    /// Make listing fail for an account with expired credentials.
    pub fn with_auth_failure(self, account_id: impl Into<String>) -> Self {
        self.auth_failures.write().unwrap().push(account_id.into());
        self
    }

    /// Make detail fetch fail for one message id.
    pub fn with_detail_failure(self, message_id: impl Into<String>) -> Self {
        self.detail_failures.write().unwrap().push(message_id.into());
        self
    }

    /// All calls made to this mock.
    pub fn calls(&self) -> Vec<MockPlatformCall> {
        self.calls.read().unwrap().clone()
    }

    /// Only the list calls.
    pub fn list_calls(&self) -> Vec<MockPlatformCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, MockPlatformCall::List { .. }))
            .collect()
    }

    /// Number of detail fetches made.
    pub fn detail_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockPlatformCall::Detail { .. }))
            .count()
    }

    fn listing_entry(&self, detail: &RawMessageDetail) -> RawMessage {
        let snippet = self
            .snippets
            .read()
            .unwrap()
            .get(&detail.id)
            .cloned()
            .unwrap_or_else(|| detail.body_text());

        let mut raw = RawMessage::new(&detail.id, &detail.title)
            .with_sender(&detail.sender)
            .with_timestamp(&detail.timestamp)
            .with_snippet(snippet);
        if let Some(link) = &detail.link {
            raw = raw.with_link(link.clone());
        }
        raw
    }

    fn matches_mail_query(detail: &RawMessageDetail, query: &str) -> bool {
        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.contains(':'))
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", detail.title, detail.body_text()).to_lowercase();
        tokens.iter().any(|t| haystack.contains(t))
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn list_recent(
        &self,
        account: &AccountHandle,
        query: &PlatformQuery,
        limit: usize,
    ) -> AccountResult<Vec<RawMessage>> {
        self.calls.write().unwrap().push(MockPlatformCall::List {
            account_id: account.account_id.clone(),
            limit,
            unfiltered: query.is_unfiltered(),
        });

        if self
            .auth_failures
            .read()
            .unwrap()
            .contains(&account.account_id)
        {
            return Err(AccountError::Auth {
                account_id: account.account_id.clone(),
            });
        }

        let messages = self.messages.read().unwrap();
        let Some(details) = messages.get(&account.account_id) else {
            return Ok(Vec::new());
        };

        let listed: Vec<RawMessage> = details
            .iter()
            .filter(|d| match query {
                PlatformQuery::Mail(q) => Self::matches_mail_query(d, q),
                PlatformQuery::Terms(_) => true,
            })
            .take(limit)
            .map(|d| self.listing_entry(d))
            .collect();

        Ok(listed)
    }

    async fn get_detail(
        &self,
        account: &AccountHandle,
        message_id: &str,
    ) -> AccountResult<RawMessageDetail> {
        self.calls.write().unwrap().push(MockPlatformCall::Detail {
            account_id: account.account_id.clone(),
            message_id: message_id.to_string(),
        });

        if self
            .detail_failures
            .read()
            .unwrap()
            .contains(&message_id.to_string())
        {
            return Err(AccountError::NotFound {
                id: message_id.to_string(),
            });
        }

        self.messages
            .read()
            .unwrap()
            .get(&account.account_id)
            .and_then(|details| details.iter().find(|d| d.id == message_id))
            .cloned()
            .ok_or_else(|| AccountError::NotFound {
                id: message_id.to_string(),
            })
    }
}

/// An in-memory account store. Clones share registered accounts and
/// the invalidation record.
#[derive(Clone, Default)]
pub struct MockAccounts {
    accounts: Arc<RwLock<HashMap<String, Vec<AccountHandle>>>>,
    invalidated: Arc<RwLock<Vec<String>>>,
}

impl MockAccounts {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account for a user.
    pub fn with_account(self, user_id: impl Into<String>, handle: AccountHandle) -> Self {
        self.accounts
            .write()
            .unwrap()
            .entry(user_id.into())
            .or_default()
            .push(handle);
        self
    }

    /// Account ids invalidated so far.
    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.read().unwrap().clone()
    }
}

#[async_trait]
impl AccountStore for MockAccounts {
    async fn list_accounts(&self, user_id: &str) -> AccountResult<Vec<AccountHandle>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn invalidate(&self, account_id: &str) -> AccountResult<()> {
        self.invalidated.write().unwrap().push(account_id.to_string());
        Ok(())
    }
}
