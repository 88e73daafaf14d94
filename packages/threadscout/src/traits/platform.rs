//! Platform client trait and raw message shapes.
//!
//! Raw API payloads differ per platform. Rather than passing untyped
//! maps through the pipeline, each platform's body is one variant of
//! a tagged union with an explicit normalization path into
//! [`NormalizedMessage`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decode;
use crate::error::AccountResult;
use crate::types::account::{AccountHandle, Platform};
use crate::types::message::NormalizedMessage;

/// A query in the form one platform natively consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformQuery {
    /// Server-side query string in the mail backend's search grammar.
    ///
    /// Empty means "most recent, unfiltered", never "nothing".
    Mail(String),

    /// Client-side substring filter for platforms without server-side
    /// free-text search.
    Terms(TermFilter),
}

impl PlatformQuery {
    /// Whether this query constrains results at all.
    pub fn is_unfiltered(&self) -> bool {
        match self {
            PlatformQuery::Mail(q) => q.trim().is_empty(),
            PlatformQuery::Terms(f) => f.is_empty(),
        }
    }
}

/// Case-insensitive OR-across-terms substring filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFilter {
    terms: Vec<String>,
}

impl TermFilter {
    /// Build a filter from a term set; empty terms are dropped.
    pub fn new(terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.into().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Whether no terms remain. An empty filter matches everything.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The lowercased terms.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether any term occurs in `text`, case-insensitively.
    ///
    /// An empty filter matches all text.
    pub fn matches(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let haystack = text.to_lowercase();
        self.terms.iter().any(|t| haystack.contains(t))
    }
}

/// One entry from a platform's list/search call.
///
/// Listing entries are cheap; the full body arrives only with
/// [`RawMessageDetail`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Stable message id within the platform + account
    pub id: String,

    /// Subject or thread title
    pub title: String,

    /// Sender as the platform reports it
    pub sender: String,

    /// Timestamp string as the platform reports it
    pub timestamp: String,

    /// Short server-provided snippet (may be empty)
    pub snippet: String,

    /// Deep link if the platform provides one
    pub link: Option<String>,
}

impl RawMessage {
    /// Create a listing entry.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sender: String::new(),
            timestamp: String::new(),
            snippet: String::new(),
            link: None,
        }
    }

    /// Set the sender.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set the deep link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// A message body in its platform-native encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum RawBody {
    /// Mail MIME tree; leaf data is URL-safe base64
    MailMime(MimePart),

    /// Workspace-chat body with HTML tags and entities
    ChatHtml(String),

    /// Already-plain text
    Plain(String),
}

/// One node of a MIME tree.
///
/// Either a leaf carrying base64 data or a multipart container with
/// nested parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimePart {
    /// MIME type, e.g. `text/plain`, `multipart/alternative`
    pub mime_type: String,

    /// URL-safe base64 payload for leaf parts
    #[serde(default)]
    pub data_b64: Option<String>,

    /// Nested parts for multipart containers
    #[serde(default)]
    pub parts: Vec<MimePart>,
}

impl MimePart {
    /// A leaf part with base64 data.
    pub fn leaf(mime_type: impl Into<String>, data_b64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_b64: Some(data_b64.into()),
            parts: Vec::new(),
        }
    }

    /// A multipart container.
    pub fn multipart(mime_type: impl Into<String>, parts: Vec<MimePart>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_b64: None,
            parts,
        }
    }
}

/// Full message detail from one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessageDetail {
    /// Stable message id
    pub id: String,

    /// Subject or thread title
    pub title: String,

    /// Sender as the platform reports it
    pub sender: String,

    /// Timestamp string as the platform reports it
    pub timestamp: String,

    /// Deep link if the platform provides one
    pub link: Option<String>,

    /// Platform-native body
    pub body: RawBody,

    /// Raw platform-specific fields for UI passthrough
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl RawMessageDetail {
    /// Create a detail record with a plain-text body.
    pub fn plain(
        id: impl Into<String>,
        title: impl Into<String>,
        sender: impl Into<String>,
        timestamp: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sender: sender.into(),
            timestamp: timestamp.into(),
            link: None,
            body: RawBody::Plain(body.into()),
            extra: serde_json::Value::Null,
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: RawBody) -> Self {
        self.body = body;
        self
    }

    /// Set the deep link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Attach raw platform fields.
    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }

    /// Decode the body to plain text.
    pub fn body_text(&self) -> String {
        decode::body_text(&self.body)
    }

    /// Normalize into the platform-agnostic shape.
    ///
    /// The body is decoded to plain text and truncated to
    /// `preview_chars`. The deep link prefers the platform-provided
    /// link, falling back to one built from the account's link base.
    pub fn normalize(
        &self,
        account: &AccountHandle,
        preview_chars: usize,
    ) -> NormalizedMessage {
        let external_url = self.link.clone().or_else(|| {
            account
                .link_base
                .as_ref()
                .map(|base| format!("{}/{}", base.trim_end_matches('/'), self.id))
        });

        let mut message = NormalizedMessage::new(&self.id, account.platform, &account.display_label)
            .with_title(&self.title)
            .with_sender(&self.sender)
            .with_timestamp(&self.timestamp)
            .with_body(decode::truncate_chars(&self.body_text(), preview_chars))
            .with_extra(self.extra.clone());
        if let Some(url) = external_url {
            message = message.with_url(url);
        }
        message
    }
}

/// Seam to one platform's API.
///
/// One implementation per platform (and per test double). Both calls
/// fail with [`crate::error::AccountError`], which the retriever
/// isolates per account and per message.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// List recent messages, optionally constrained by a query.
    ///
    /// For [`PlatformQuery::Mail`] the backend applies the query
    /// server-side; for [`PlatformQuery::Terms`] backends without
    /// server search return their recent buffer and the retriever
    /// filters client-side.
    async fn list_recent(
        &self,
        account: &AccountHandle,
        query: &PlatformQuery,
        limit: usize,
    ) -> AccountResult<Vec<RawMessage>>;

    /// Fetch full detail for one message.
    async fn get_detail(
        &self,
        account: &AccountHandle,
        message_id: &str,
    ) -> AccountResult<RawMessageDetail>;
}

/// Build the platform-appropriate "recent documents" query for a
/// lookback window ending now.
pub fn lookback_query(platform: Platform, after: chrono::NaiveDate) -> PlatformQuery {
    if platform.has_server_search() {
        PlatformQuery::Mail(format!("after:{}", after.format("%Y/%m/%d")))
    } else {
        PlatformQuery::Terms(TermFilter::default())
    }
}
