//! Structured search intent extracted from free text.

use serde::{Deserialize, Serialize};

/// The structured interpretation of one free-text query.
///
/// Produced once per request by the intent extractor and consumed by
/// every platform query builder. Every field defaults to empty: a
/// failed extraction degrades to a "most recent" search rather than
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIntent {
    /// Full person names ("Alyssa Hacker")
    #[serde(default)]
    pub names: Vec<String>,

    /// Explicit email addresses
    #[serde(default)]
    pub email_addresses: Vec<String>,

    /// Subject-matter topics ("quarterly budget")
    #[serde(default)]
    pub topics: Vec<String>,

    /// Informal date phrases ("last week", "2 years ago", "2023")
    #[serde(default)]
    pub date_hints: Vec<String>,

    /// Remaining search keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Name fragments ("starts with Jo")
    #[serde(default)]
    pub partial_names: Vec<String>,
}

impl SearchIntent {
    /// Whether no field carries any term.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.email_addresses.is_empty()
            && self.topics.is_empty()
            && self.date_hints.is_empty()
            && self.keywords.is_empty()
            && self.partial_names.is_empty()
    }

    /// Flattened term set for client-side substring filtering.
    ///
    /// Names, topics, keywords and partial names, in that order.
    /// Date hints and addresses are excluded: neither makes sense as
    /// a substring match against chat text.
    pub fn flattened_terms(&self) -> Vec<String> {
        self.names
            .iter()
            .chain(self.topics.iter())
            .chain(self.keywords.iter())
            .chain(self.partial_names.iter())
            .cloned()
            .collect()
    }
}
