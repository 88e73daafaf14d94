//! Top-level search orchestration.
//!
//! [`Searcher`] wires the intent extractor, query builders, fan-out
//! retriever and signal scanner behind one facade. One instance is
//! shared across requests; per-request state lives on the stack.

use chrono::Utc;
use futures::future::join_all;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{Result, SearchError};
use crate::pipeline::intent::extract_intent;
use crate::pipeline::prompts::{format_answer_user, ANSWER_SYSTEM};
use crate::pipeline::query::build_query;
use crate::pipeline::retrieve::retrieve;
use crate::pipeline::scanner::{scan, SignalDigest};
use crate::traits::accounts::AccountStore;
use crate::traits::language::LanguageBackend;
use crate::traits::platform::PlatformClient;
use crate::types::account::Platform;
use crate::types::config::{ScanConfig, SearchConfig};
use crate::types::intent::SearchIntent;
use crate::types::message::NormalizedMessage;

/// Answer text when no account is connected for any requested platform.
const NEEDS_CONNECTION_ANSWER: &str =
    "No accounts are connected for the requested platforms. Connect an account to search it.";

/// Answer text when the search matched nothing.
const EMPTY_RESULTS_ANSWER: &str =
    "I couldn't find any matching messages. Try different names, topics, or a wider date range.";

/// Structured outcome of one search.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// The extracted query intent, for display and debugging
    pub intent: SearchIntent,

    /// Full result lists, one entry per requested platform (empty
    /// lists included so the caller can render every platform)
    pub results_by_platform: IndexMap<Platform, Vec<NormalizedMessage>>,

    /// Citation subset: each platform's newest few results, platform
    /// grouping preserved
    pub sources: Vec<NormalizedMessage>,

    /// Platforms that produced at least one result
    pub services_with_results: Vec<Platform>,

    /// True when zero accounts were connected across every requested
    /// platform; an empty result with connected accounts leaves this
    /// false
    pub needs_connection: bool,
}

impl SearchResponse {
    /// Whether the search produced no results at all.
    pub fn is_empty(&self) -> bool {
        self.results_by_platform.values().all(|v| v.is_empty())
    }
}

/// A synthesized answer plus the structured results behind it.
#[derive(Debug, Clone)]
pub struct SearchAnswer {
    /// Natural-language answer grounded in the sources
    pub answer: String,

    /// The underlying structured response
    pub response: SearchResponse,
}

/// The search facade: holds the three injected backends plus tuning.
pub struct Searcher<L, C, R> {
    language: L,
    client: C,
    accounts: R,
    search_config: SearchConfig,
    scan_config: ScanConfig,
}

impl<L, C, R> Searcher<L, C, R>
where
    L: LanguageBackend,
    C: PlatformClient,
    R: AccountStore,
{
    /// Create a searcher with default tuning.
    pub fn new(language: L, client: C, accounts: R) -> Self {
        Self {
            language,
            client,
            accounts,
            search_config: SearchConfig::default(),
            scan_config: ScanConfig::default(),
        }
    }

    /// Override the retrieval tuning.
    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search_config = config;
        self
    }

    /// Override the scanner tuning.
    pub fn with_scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Search the user's connected accounts with free text.
    ///
    /// An empty `platforms` slice searches every platform. Single
    /// account failures never fail the request; only an account-store
    /// failure does.
    pub async fn search(
        &self,
        user_id: &str,
        text: &str,
        platforms: &[Platform],
    ) -> Result<SearchResponse> {
        self.search_with_cancel(user_id, text, platforms, &CancellationToken::new())
            .await
    }

    /// [`Self::search`] with cooperative cancellation.
    ///
    /// Cancellation aborts between stages and mid-retrieval; the
    /// result is [`SearchError::Cancelled`] rather than a partial
    /// response.
    pub async fn search_with_cancel(
        &self,
        user_id: &str,
        text: &str,
        platforms: &[Platform],
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        let requested = requested_platforms(platforms);

        let intent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            intent = extract_intent(&self.language, text) => intent,
        };

        let all_accounts = self.accounts.list_accounts(user_id).await?;
        let now = Utc::now();

        let retrievals = requested.iter().map(|&platform| {
            let accounts: Vec<_> = all_accounts
                .iter()
                .filter(|a| a.platform == platform)
                .cloned()
                .collect();
            let intent = &intent;
            async move {
                if accounts.is_empty() {
                    return (platform, Vec::new());
                }
                let query = build_query(platform, intent, now);
                let messages = retrieve(
                    &self.client,
                    &self.accounts,
                    &accounts,
                    &query,
                    &self.search_config,
                )
                .await;
                (platform, messages)
            }
        });

        let gathered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            gathered = join_all(retrievals) => gathered,
        };

        let needs_connection = requested
            .iter()
            .all(|&p| !all_accounts.iter().any(|a| a.platform == p));

        let results_by_platform: IndexMap<Platform, Vec<NormalizedMessage>> =
            gathered.into_iter().collect();
        let services_with_results: Vec<Platform> = results_by_platform
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(p, _)| *p)
            .collect();
        let sources: Vec<NormalizedMessage> = results_by_platform
            .values()
            .flat_map(|v| v.iter().take(self.search_config.response_cap).cloned())
            .collect();

        info!(
            user_id,
            platforms = ?services_with_results,
            results = results_by_platform.values().map(Vec::len).sum::<usize>(),
            "search complete"
        );

        Ok(SearchResponse {
            intent,
            results_by_platform,
            sources,
            services_with_results,
            needs_connection,
        })
    }

    /// Search, then synthesize a natural-language answer over the
    /// citation sources.
    ///
    /// With no connected accounts or no results the answer is a fixed
    /// guidance string and no synthesis call is made. A synthesis
    /// failure is the one language-backend error surfaced to the
    /// caller, since there is nothing sensible to degrade to.
    pub async fn answer(
        &self,
        user_id: &str,
        text: &str,
        platforms: &[Platform],
    ) -> Result<SearchAnswer> {
        let response = self.search(user_id, text, platforms).await?;

        if response.needs_connection {
            return Ok(SearchAnswer {
                answer: NEEDS_CONNECTION_ANSWER.to_string(),
                response,
            });
        }
        if response.sources.is_empty() {
            return Ok(SearchAnswer {
                answer: EMPTY_RESULTS_ANSWER.to_string(),
                response,
            });
        }

        let context = render_context(&response.sources);
        let answer = self
            .language
            .complete(ANSWER_SYSTEM, &format_answer_user(text, &context), 0.3, 800)
            .await?;

        Ok(SearchAnswer { answer, response })
    }

    /// Scan one platform's accounts for a ranked signal digest.
    ///
    /// No connected accounts yields an empty digest, not an error.
    pub async fn scan_signals(
        &self,
        user_id: &str,
        platform: Platform,
        limit: usize,
    ) -> Result<SignalDigest> {
        self.scan_signals_with_cancel(user_id, platform, limit, &CancellationToken::new())
            .await
    }

    /// [`Self::scan_signals`] with cooperative cancellation.
    ///
    /// The token is checked between batches and accounts; in-flight
    /// analyses finish and a partial digest is returned.
    pub async fn scan_signals_with_cancel(
        &self,
        user_id: &str,
        platform: Platform,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<SignalDigest> {
        let accounts: Vec<_> = self
            .accounts
            .list_accounts(user_id)
            .await?
            .into_iter()
            .filter(|a| a.platform == platform)
            .collect();

        Ok(scan(
            &self.client,
            &self.language,
            &accounts,
            limit,
            &self.scan_config,
            cancel,
        )
        .await)
    }
}

/// Resolve the requested platform set, defaulting to all, dropping
/// duplicates while keeping request order.
fn requested_platforms(platforms: &[Platform]) -> Vec<Platform> {
    if platforms.is_empty() {
        return Platform::ALL.to_vec();
    }
    let mut seen = Vec::new();
    for &p in platforms {
        if !seen.contains(&p) {
            seen.push(p);
        }
    }
    seen
}

/// Render citation sources as synthesis context, one block per message.
fn render_context(sources: &[NormalizedMessage]) -> String {
    sources
        .iter()
        .map(|m| {
            format!(
                "[{} / {}] {} ({})\nSubject: {}\n{}",
                m.platform.as_str(),
                m.account_label,
                m.sender_label,
                m.timestamp,
                m.title,
                m.body_preview,
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}
