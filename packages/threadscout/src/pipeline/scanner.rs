//! Signal extraction scanner.
//!
//! Walks a bounded window of recent documents per account, analyzing
//! them in fixed-size concurrent batches against the language
//! backend. Batches run strictly in order with a small inter-batch
//! pause for backend rate limits; each document's analysis races an
//! 8-second deadline, and scanning stops early once enough raw
//! signals have accumulated.

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::decode::truncate_chars;
use crate::pipeline::intent::first_json_array;
use crate::pipeline::prompts::{format_signal_user, SIGNAL_SYSTEM};
use crate::traits::language::LanguageBackend;
use crate::traits::platform::{lookback_query, PlatformClient, RawMessage};
use crate::types::account::AccountHandle;
use crate::types::config::ScanConfig;
use crate::types::signal::{MemorySignal, SignalKind};

/// Maximum characters of body text sent per analysis call.
const ANALYSIS_BODY_CHARS: usize = 4000;

/// The ranked digest produced by one scan.
#[derive(Debug, Clone)]
pub struct SignalDigest {
    /// Ranked, deduplicated signals, at most the requested limit
    pub signals: Vec<MemorySignal>,

    /// Documents that entered analysis batches (including ones the
    /// pre-filter or timeout discarded)
    pub total_considered: usize,
}

/// Scan one platform's accounts for memory signals.
///
/// Accounts and batches are processed strictly in order; the token is
/// checked between batches and between accounts, and in-flight work in
/// the current batch always finishes.
pub async fn scan<C, L>(
    client: &C,
    language: &L,
    accounts: &[AccountHandle],
    requested_limit: usize,
    config: &ScanConfig,
    cancel: &CancellationToken,
) -> SignalDigest
where
    C: PlatformClient,
    L: LanguageBackend,
{
    let target = requested_limit + config.overscan;
    let lookback = Utc::now().date_naive() - ChronoDuration::days(config.lookback_days);

    let mut raw_signals: Vec<MemorySignal> = Vec::new();
    let mut total_considered = 0usize;

    'accounts: for account in accounts {
        if cancel.is_cancelled() || raw_signals.len() >= target {
            break;
        }

        let query = lookback_query(account.platform, lookback);
        let listed = match client
            .list_recent(account, &query, config.per_account_docs)
            .await
        {
            Ok(listed) => listed,
            Err(e) => {
                warn!(
                    account = %account.display_label,
                    error = %e,
                    "listing failed, skipping account"
                );
                continue;
            }
        };

        for (batch_index, batch) in listed.chunks(config.batch_size).enumerate() {
            if cancel.is_cancelled() {
                break 'accounts;
            }
            if batch_index > 0 {
                tokio::time::sleep(config.batch_delay()).await;
            }

            let analyses = batch
                .iter()
                .map(|doc| analyze_document(client, language, account, doc, config));
            for mut extracted in join_all(analyses).await {
                total_considered += 1;
                raw_signals.append(&mut extracted);
            }

            if raw_signals.len() >= target {
                debug!(
                    raw = raw_signals.len(),
                    target, "signal target reached, stopping scan early"
                );
                break 'accounts;
            }
        }
    }

    let signals = post_process(raw_signals, requested_limit, config);
    info!(
        signals = signals.len(),
        total_considered, "signal scan complete"
    );
    SignalDigest {
        signals,
        total_considered,
    }
}

/// Substrings marking automated traffic not worth analyzing.
const AUTOMATED_MARKERS: [&str; 3] = ["notification", "automated", "no-reply"];

fn looks_automated(text: &str) -> bool {
    let lowered = text.to_lowercase();
    AUTOMATED_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Analyze one document; failures and timeouts yield zero signals.
async fn analyze_document<C, L>(
    client: &C,
    language: &L,
    account: &AccountHandle,
    doc: &RawMessage,
    config: &ScanConfig,
) -> Vec<MemorySignal>
where
    C: PlatformClient,
    L: LanguageBackend,
{
    // Cheap pre-filter on listing fields, before any fetch
    if looks_automated(&doc.title) || looks_automated(&doc.snippet) {
        debug!(message_id = %doc.id, "skipping automated document");
        return Vec::new();
    }

    // Tiered body retrieval: the server snippet is free, the full
    // body fetch is the expensive call
    let body = if doc.snippet.chars().count() >= config.snippet_fetch_threshold {
        doc.snippet.clone()
    } else {
        match client.get_detail(account, &doc.id).await {
            Ok(detail) => detail.body_text(),
            Err(e) => {
                warn!(message_id = %doc.id, error = %e, "body fetch failed, using snippet");
                doc.snippet.clone()
            }
        }
    };

    if body.chars().count() < config.min_body_chars || looks_automated(&body) {
        return Vec::new();
    }

    let prompt = format_signal_user(
        &doc.sender,
        &doc.timestamp,
        &doc.title,
        &truncate_chars(&body, ANALYSIS_BODY_CHARS),
    );

    let completion = tokio::time::timeout(
        config.doc_timeout(),
        language.complete(SIGNAL_SYSTEM, &prompt, 0.2, 600),
    )
    .await;

    match completion {
        Ok(Ok(reply)) => parse_signals(&reply, doc, account),
        Ok(Err(e)) => {
            warn!(message_id = %doc.id, error = %e, "analysis call failed");
            Vec::new()
        }
        Err(_) => {
            warn!(message_id = %doc.id, "analysis timed out");
            Vec::new()
        }
    }
}

/// One element of the backend's signal array, before validation.
#[derive(Debug, Deserialize)]
struct RawSignalItem {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    summary: String,
    #[serde(default = "default_importance")]
    importance: i64,
    #[serde(default)]
    unresolved: bool,
    #[serde(default)]
    quotes: Vec<String>,
}

fn default_importance() -> i64 {
    5
}

/// Parse a backend reply into signals for one document.
///
/// Unparsable output, or elements missing required fields, drop the
/// whole document's contribution silently. At most two signals are
/// kept per document.
fn parse_signals(reply: &str, doc: &RawMessage, account: &AccountHandle) -> Vec<MemorySignal> {
    let Some(json) = first_json_array(reply) else {
        warn!(message_id = %doc.id, "no signal array in reply");
        return Vec::new();
    };
    let items: Vec<RawSignalItem> = match serde_json::from_str(json) {
        Ok(items) => items,
        Err(e) => {
            warn!(message_id = %doc.id, error = %e, "malformed signal array");
            return Vec::new();
        }
    };

    let source_url = doc.link.clone().or_else(|| {
        account
            .link_base
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), doc.id))
    });

    items
        .into_iter()
        .take(2)
        .enumerate()
        .filter_map(|(index, item)| {
            let kind: SignalKind = item.kind.parse().ok()?;
            let mut signal = MemorySignal::new(
                &doc.id,
                index,
                kind,
                &item.title,
                &item.summary,
                item.importance,
                item.unresolved,
            )
            .with_sender(&doc.sender)
            .with_timestamp(&doc.timestamp)
            .with_quotes(item.quotes);
            if let Some(url) = &source_url {
                signal = signal.with_url(url.clone());
            }
            Some(signal)
        })
        .collect()
}

/// Rank, deduplicate, filter and truncate raw signals.
///
/// Sort first so the dedup pass keeps the highest-ranked copy of each
/// (kind, title) pair.
fn post_process(
    mut raw: Vec<MemorySignal>,
    requested_limit: usize,
    config: &ScanConfig,
) -> Vec<MemorySignal> {
    raw.sort_by(|a, b| {
        b.unresolved
            .cmp(&a.unresolved)
            .then(b.importance.cmp(&a.importance))
    });

    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<MemorySignal> = raw
        .into_iter()
        .filter(|s| seen.insert(s.dedup_key()))
        .filter(|s| s.importance >= config.min_importance)
        .collect();
    out.truncate(requested_limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLanguage, MockPlatform};
    use crate::traits::platform::RawMessageDetail;
    use crate::types::account::Platform;

    fn account(id: &str) -> AccountHandle {
        AccountHandle::new(Platform::Mail, id, id)
    }

    fn long_body(text: &str) -> String {
        format!("{text} {}", "filler content ".repeat(20))
    }

    fn signal_json(kind: &str, title: &str, importance: u8, unresolved: bool) -> String {
        format!(
            r#"[{{"type": "{kind}", "title": "{title}", "summary": "s", "importance": {importance}, "unresolved": {unresolved}}}]"#
        )
    }

    #[test]
    fn test_parse_signals_defaults_and_caps() {
        let doc = RawMessage::new("m1", "subject").with_sender("Ren");
        let acct = account("a1").with_link_base("https://mail.example.com");
        let reply = r#"prose first
[
  {"type": "decision", "title": "Ship Friday", "summary": "we ship"},
  {"type": "risk", "title": "Deps late", "summary": "vendor slip"},
  {"type": "insight", "title": "Third is dropped", "summary": "over the cap"}
]"#;

        let signals = parse_signals(reply, &doc, &acct);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].importance, 5); // default applied
        assert!(!signals[0].unresolved);
        assert_eq!(signals[0].id, "m1-0");
        assert_eq!(
            signals[0].source_url.as_deref(),
            Some("https://mail.example.com/m1")
        );
    }

    #[test]
    fn test_parse_signals_unknown_kind_skipped() {
        let doc = RawMessage::new("m1", "subject");
        let reply = r#"[{"type": "vibe", "title": "t", "summary": "s"},
                        {"type": "risk", "title": "t", "summary": "s"}]"#;
        let signals = parse_signals(reply, &doc, &account("a1"));
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, SignalKind::Risk);
    }

    #[test]
    fn test_parse_signals_missing_field_drops_document() {
        let doc = RawMessage::new("m1", "subject");
        // Second element lacks "summary": the whole array fails
        let reply = r#"[{"type": "risk", "title": "t", "summary": "s"},
                        {"type": "risk", "title": "only title"}]"#;
        assert!(parse_signals(reply, &doc, &account("a1")).is_empty());
    }

    #[test]
    fn test_post_process_orders_dedups_filters() {
        let config = ScanConfig::default();
        let raw = vec![
            MemorySignal::new("m1", 0, SignalKind::Decision, "Ship it", "s", 7, false),
            MemorySignal::new("m2", 0, SignalKind::Decision, "SHIP IT", "s", 9, false),
            MemorySignal::new("m3", 0, SignalKind::Risk, "Low grade", "s", 4, false),
            MemorySignal::new("m4", 0, SignalKind::OpenQuestion, "Who owns QA?", "s", 6, true),
        ];

        let out = post_process(raw, 10, &config);

        // Unresolved first, then importance; duplicate keeps the 9
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, SignalKind::OpenQuestion);
        assert_eq!(out[1].importance, 9);
        assert!(out.iter().all(|s| s.importance >= 6));
    }

    #[test]
    fn test_post_process_truncates_to_limit() {
        let config = ScanConfig::default();
        let raw = (0..6)
            .map(|i| {
                MemorySignal::new(
                    &format!("m{i}"),
                    0,
                    SignalKind::Insight,
                    &format!("title {i}"),
                    "s",
                    8,
                    false,
                )
            })
            .collect();
        assert_eq!(post_process(raw, 3, &config).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_happy_path() {
        let platform = MockPlatform::new().with_message(
            "a1",
            RawMessageDetail::plain(
                "m1",
                "launch planning",
                "Ren",
                "2024-03-01T00:00:00Z",
                long_body("we decided to ship on friday"),
            ),
        );
        let language = MockLanguage::new()
            .with_reply("launch planning", signal_json("decision", "Ship Friday", 8, false));

        let digest = scan(
            &platform,
            &language,
            &[account("a1")],
            5,
            &ScanConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(digest.total_considered, 1);
        assert_eq!(digest.signals.len(), 1);
        assert_eq!(digest.signals[0].title, "Ship Friday");
        assert_eq!(digest.signals[0].source_sender, "Ren");
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_early_stop_skips_later_accounts() {
        let mut platform = MockPlatform::new();
        // Account 1 carries enough signal-rich docs to hit the target
        for i in 0..6 {
            platform = platform.with_message(
                "a1",
                RawMessageDetail::plain(
                    format!("m{i}"),
                    format!("topic {i}"),
                    "Ren",
                    "2024-03-01T00:00:00Z",
                    long_body("meaningful discussion"),
                ),
            );
        }
        platform = platform.with_message(
            "a2",
            RawMessageDetail::plain("never", "untouched", "Ren", "", long_body("x")),
        );

        let mut language = MockLanguage::new();
        for i in 0..6 {
            language = language.with_reply(
                format!("topic {i}"),
                signal_json("insight", &format!("finding {i}"), 8, false),
            );
        }

        let digest = scan(
            &platform,
            &language,
            &[account("a1"), account("a2")],
            2,
            &ScanConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        // target = 2 + 2 = 4 raw signals, reached after batch 2 of
        // account 1; account 2 is never listed
        let listed_accounts: Vec<_> = platform
            .list_calls()
            .iter()
            .filter_map(|c| match c {
                crate::testing::MockPlatformCall::List { account_id, .. } => {
                    Some(account_id.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(listed_accounts, vec!["a1"]);
        assert_eq!(digest.signals.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_timeout_yields_zero_signals() {
        let platform = MockPlatform::new()
            .with_message(
                "a1",
                RawMessageDetail::plain("slow", "slow topic", "Ren", "", long_body("s")),
            )
            .with_message(
                "a1",
                RawMessageDetail::plain("fast", "fast topic", "Ren", "", long_body("f")),
            );

        let language = MockLanguage::new()
            .with_delayed_reply("slow topic", signal_json("risk", "Too late", 9, false), 60_000)
            .with_reply("fast topic", signal_json("decision", "On time", 8, false));

        let digest = scan(
            &platform,
            &language,
            &[account("a1")],
            5,
            &ScanConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(digest.total_considered, 2);
        assert_eq!(digest.signals.len(), 1);
        assert_eq!(digest.signals[0].title, "On time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_prefilter_skips_automated() {
        let platform = MockPlatform::new()
            .with_message(
                "a1",
                RawMessageDetail::plain("n1", "Build notification", "bot", "", long_body("x")),
            )
            .with_message(
                "a1",
                RawMessageDetail::plain("n2", "short", "Ren", "", "too short"),
            );
        let language = MockLanguage::new();

        let digest = scan(
            &platform,
            &language,
            &[account("a1")],
            5,
            &ScanConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        // Neither document reached the language backend
        assert!(language.calls().is_empty());
        assert_eq!(digest.total_considered, 2);
        assert!(digest.signals.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_tiered_fetch_skips_detail_for_long_snippets() {
        let body = long_body("a perfectly long body");
        let platform = MockPlatform::new()
            .with_message(
                "a1",
                RawMessageDetail::plain("m1", "rich snippet", "Ren", "", body.clone()),
            )
            .with_snippet("m1", body);
        let language = MockLanguage::new()
            .with_reply("rich snippet", signal_json("insight", "From snippet", 7, false));

        let digest = scan(
            &platform,
            &language,
            &[account("a1")],
            5,
            &ScanConfig::default(),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(platform.detail_call_count(), 0);
        assert_eq!(digest.signals.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_cancelled_before_work() {
        let platform = MockPlatform::new().with_message(
            "a1",
            RawMessageDetail::plain("m1", "t", "Ren", "", long_body("x")),
        );
        let language = MockLanguage::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let digest = scan(
            &platform,
            &language,
            &[account("a1")],
            5,
            &ScanConfig::default(),
            &cancel,
        )
        .await;

        assert_eq!(digest.total_considered, 0);
        assert!(platform.list_calls().is_empty());
    }
}
