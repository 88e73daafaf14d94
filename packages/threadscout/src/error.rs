//! Typed errors for the search pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to keep the
//! failure taxonomy explicit. Only `SearchError` ever reaches the
//! caller: account and language failures are isolated at their call
//! sites and degrade to smaller result sets.

use thiserror::Error;

/// Request-level errors surfaced to the caller.
///
/// Everything not representable here degrades gracefully: a failing
/// account contributes zero results, a malformed language-backend
/// reply yields an empty intent or zero signals.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A required backend is unavailable or misconfigured
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The account store itself failed (not a single account)
    #[error("account store error: {0}")]
    Accounts(#[from] AccountError),

    /// Language backend failure at a point with no fallback
    #[error("language backend error: {0}")]
    Language(#[from] LanguageError),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors scoped to one account or one message fetch.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Credentials invalid or expired
    #[error("credentials expired for account {account_id}")]
    Auth { account_id: String },

    /// Network or HTTP-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Message id unknown to the backend
    #[error("message not found: {id}")]
    NotFound { id: String },

    /// The platform call timed out
    #[error("platform request timed out")]
    Timeout,
}

impl AccountError {
    /// Whether this failure indicates expired credentials.
    ///
    /// Drives credential invalidation for mail accounts; other error
    /// kinds leave the stored token untouched.
    pub fn is_auth_expiry(&self) -> bool {
        matches!(self, AccountError::Auth { .. })
    }
}

/// Errors from the language backend.
///
/// The backend is treated as unreliable: every call site recovers
/// locally (empty intent, zero signals, sources-only answer).
#[derive(Debug, Error)]
pub enum LanguageError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Backend returned an empty completion
    #[error("empty completion")]
    Empty,

    /// Completion did not contain the expected structure
    #[error("malformed completion: {0}")]
    Malformed(String),
}

/// Result type alias for request-level operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Result type alias for per-account operations.
pub type AccountResult<T> = std::result::Result<T, AccountError>;

/// Result type alias for language-backend operations.
pub type LanguageResult<T> = std::result::Result<T, LanguageError>;
