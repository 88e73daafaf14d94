//! Platform-agnostic message representation and result ordering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::account::Platform;

/// A platform-agnostic representation of one retrieved document.
///
/// Produced by the fan-out retriever from each platform's native
/// response shape. `id` is stable across repeated fetches of the same
/// underlying message and keys deduplication. Nothing is mutated
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Globally unique id per platform + account
    pub id: String,

    /// Originating platform
    pub platform: Platform,

    /// Display label of the account the message came from
    pub account_label: String,

    /// Subject line or channel/thread title
    pub title: String,

    /// Human-readable sender
    pub sender_label: String,

    /// RFC 3339 timestamp, or a best-effort parseable string
    pub timestamp: String,

    /// Decoded plain-text body, truncated to the preview limit
    pub body_preview: String,

    /// Deep link into the source platform, when constructible
    pub external_url: Option<String>,

    /// Raw platform-specific fields, passed through untouched for UI use
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl NormalizedMessage {
    /// Create a message with the required fields.
    pub fn new(
        id: impl Into<String>,
        platform: Platform,
        account_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            platform,
            account_label: account_label.into(),
            title: String::new(),
            sender_label: String::new(),
            timestamp: String::new(),
            body_preview: String::new(),
            external_url: None,
            extra: serde_json::Value::Null,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the sender label.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_label = sender.into();
        self
    }

    /// Set the timestamp string.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the body preview.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_preview = body.into();
        self
    }

    /// Set the external URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }

    /// Attach the raw platform payload for UI passthrough.
    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }

    /// Best-effort timestamp parse.
    ///
    /// Tries RFC 3339, then RFC 2822, then a few bare formats the
    /// platforms are known to emit. `None` means the message sorts
    /// after every parseable one.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse a timestamp string in the formats the platforms emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Sort messages newest first, stably.
///
/// Unparsable timestamps sort last, preserving their arrival order.
pub fn sort_by_recency(messages: &mut [NormalizedMessage]) {
    messages.sort_by_key(|m| std::cmp::Reverse(m.parsed_timestamp()));
}

/// Merge a fresh fetch into a previously retained buffer.
///
/// Fresh items come first and fully replace any retained item sharing
/// their id; surviving retained items follow in their original order.
/// The merged buffer is capped at `retain_cap`, newest first.
pub fn merge_resync(
    existing: Vec<NormalizedMessage>,
    fresh: Vec<NormalizedMessage>,
    retain_cap: usize,
) -> Vec<NormalizedMessage> {
    let mut merged: IndexMap<String, NormalizedMessage> = IndexMap::with_capacity(
        fresh.len() + existing.len(),
    );
    for message in fresh {
        merged.insert(message.id.clone(), message);
    }
    for message in existing {
        merged.entry(message.id.clone()).or_insert(message);
    }
    merged.truncate(retain_cap);
    merged.into_values().collect()
}
