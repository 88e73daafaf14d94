//! Cross-Platform Message Search & Signal Extraction Library
//!
//! Turns a free-text question into a structured search intent, fans it
//! out concurrently across a user's connected mail, chat, and
//! workspace accounts, merges and ranks the results under partial
//! failure, and synthesizes an answer grounded in the retrieved
//! messages. A separate scanner pass distills a ranked "what matters"
//! digest of decisions, risks, questions, commitments, and insights
//! from recent traffic.
//!
//! # Design Philosophy
//!
//! **"Degrade, don't fail"**
//!
//! - One failing account, message, or model call never fails a request
//! - The language backend is untrusted: every call site has a fallback
//! - Platform payloads are typed at the edge, normalized immediately
//! - Library handles mechanics, app handles OAuth and transport
//!
//! # Usage
//!
//! ```rust,ignore
//! use threadscout::{Platform, Searcher};
//! use threadscout::testing::{MockAccounts, MockLanguage, MockPlatform};
//!
//! let searcher = Searcher::new(language, platform_client, account_store);
//!
//! // Ask across every connected account
//! let answered = searcher.answer("user-1", "what did Alyssa decide about the budget?", &[]).await?;
//!
//! // Ranked digest of one platform's recent traffic
//! let digest = searcher.scan_signals("user-1", Platform::Mail, 5).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (LanguageBackend, PlatformClient, AccountStore)
//! - [`types`] - Intent, account, message, and signal types
//! - [`pipeline`] - Intent extraction, query building, retrieval, scanning
//! - [`decode`] - Platform body decoding (base64, MIME, HTML)
//! - [`testing`] - Mock implementations for testing

pub mod decode;
pub mod error;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{AccountError, LanguageError, SearchError};
pub use traits::{
    accounts::AccountStore,
    language::LanguageBackend,
    platform::{
        lookback_query, MimePart, PlatformClient, PlatformQuery, RawBody, RawMessage,
        RawMessageDetail, TermFilter,
    },
};
pub use types::{
    account::{AccountHandle, AuthContext, Platform},
    config::{ScanConfig, SearchConfig},
    intent::SearchIntent,
    message::{merge_resync, sort_by_recency, NormalizedMessage},
    signal::{MemorySignal, SignalKind},
};

// Re-export pipeline components
pub use pipeline::{
    dates::{resolve_all, resolve_date_hint, DateWindow},
    intent::extract_intent,
    query::{build_mail_query, build_query, build_term_filter},
    retrieve::retrieve,
    scanner::{scan, SignalDigest},
    search::{SearchAnswer, SearchResponse, Searcher},
};

#[cfg(feature = "openai")]
pub use ai::OpenAI;

// Re-export testing utilities
pub use testing::{MockAccounts, MockLanguage, MockPlatform};
