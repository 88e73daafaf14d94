//! Memory signals: ranked, typed extractive summaries.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::decode::truncate_chars;

/// Maximum characters in a signal title.
pub const TITLE_MAX_CHARS: usize = 60;

/// Maximum characters in a signal summary.
pub const SUMMARY_MAX_CHARS: usize = 150;

/// Maximum supporting quotes per signal.
pub const MAX_QUOTES: usize = 2;

/// Maximum characters per supporting quote.
pub const QUOTE_MAX_CHARS: usize = 100;

/// The category of an extracted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// A decision that was made
    Decision,
    /// A risk or concern raised
    Risk,
    /// A question left unanswered
    OpenQuestion,
    /// Someone committed to doing something
    Commitment,
    /// A noteworthy observation
    Insight,
}

impl SignalKind {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Decision => "decision",
            SignalKind::Risk => "risk",
            SignalKind::OpenQuestion => "open_question",
            SignalKind::Commitment => "commitment",
            SignalKind::Insight => "insight",
        }
    }
}

impl FromStr for SignalKind {
    type Err = ();

    /// Lenient parse tolerating the phrasings models actually emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "decision" => Ok(SignalKind::Decision),
            "risk" => Ok(SignalKind::Risk),
            "open_question" | "question" => Ok(SignalKind::OpenQuestion),
            "commitment" => Ok(SignalKind::Commitment),
            "insight" => Ok(SignalKind::Insight),
            _ => Err(()),
        }
    }
}

/// One ranked signal extracted from a single source document.
///
/// Field limits from the extraction contract are enforced at
/// construction; a well-formed `MemorySignal` never exceeds them
/// regardless of what the language backend returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySignal {
    /// Derived from the source document id plus the signal's index
    pub id: String,

    /// Signal category
    pub kind: SignalKind,

    /// Short headline, at most 60 characters
    pub title: String,

    /// One-line summary, at most 150 characters
    pub summary: String,

    /// Importance on a 1-10 scale
    pub importance: u8,

    /// Whether the matter is still open
    pub unresolved: bool,

    /// Sender of the source document
    pub source_sender: String,

    /// Timestamp of the source document
    pub source_timestamp: String,

    /// Up to two supporting quotes, each at most 100 characters
    #[serde(default)]
    pub quotes: Vec<String>,

    /// Deep link to the source document
    pub source_url: Option<String>,
}

impl MemorySignal {
    /// Build a signal, clamping every bounded field.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_doc_id: &str,
        index: usize,
        kind: SignalKind,
        title: &str,
        summary: &str,
        importance: i64,
        unresolved: bool,
    ) -> Self {
        Self {
            id: format!("{source_doc_id}-{index}"),
            kind,
            title: truncate_chars(title.trim(), TITLE_MAX_CHARS),
            summary: truncate_chars(summary.trim(), SUMMARY_MAX_CHARS),
            importance: importance.clamp(1, 10) as u8,
            unresolved,
            source_sender: String::new(),
            source_timestamp: String::new(),
            quotes: Vec::new(),
            source_url: None,
        }
    }

    /// Set the source sender.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.source_sender = sender.into();
        self
    }

    /// Set the source timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.source_timestamp = timestamp.into();
        self
    }

    /// Attach supporting quotes, keeping at most two, each clamped.
    pub fn with_quotes(mut self, quotes: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.quotes = quotes
            .into_iter()
            .take(MAX_QUOTES)
            .map(|q| truncate_chars(q.as_ref().trim(), QUOTE_MAX_CHARS))
            .collect();
        self
    }

    /// Set the source deep link.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Deduplication key: kind plus case-folded title.
    pub fn dedup_key(&self) -> (SignalKind, String) {
        (self.kind, self.title.to_lowercase())
    }
}
