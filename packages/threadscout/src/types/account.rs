//! Platforms and account handles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A connected messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Mail accounts with server-side full-text search
    Mail,
    /// Chat platform, filtered client-side
    Chat,
    /// Workspace-messaging platform, filtered client-side
    Workspace,
}

impl Platform {
    /// All supported platforms, in display order.
    pub const ALL: [Platform; 3] = [Platform::Mail, Platform::Chat, Platform::Workspace];

    /// Stable lowercase name used in request/response shapes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mail => "mail",
            Platform::Chat => "chat",
            Platform::Workspace => "workspace",
        }
    }

    /// Whether this platform supports a server-side query string.
    ///
    /// Chat and workspace backends have no free-text search; their
    /// results are filtered client-side against a recent buffer.
    pub fn has_server_search(&self) -> bool {
        matches!(self, Platform::Mail)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mail" | "email" => Ok(Platform::Mail),
            "chat" => Ok(Platform::Chat),
            "workspace" => Ok(Platform::Workspace),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Error for unrecognized platform names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform: {}", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

/// Opaque credential reference for one account.
///
/// The library never interprets the contents; platform clients carry
/// it back to the external credential store. Debug output is redacted
/// so handles can be logged freely.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthContext(String);

impl AuthContext {
    /// Wrap a credential reference.
    pub fn new(token_ref: impl Into<String>) -> Self {
        Self(token_ref.into())
    }

    /// The underlying credential reference.
    pub fn token_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthContext(..)")
    }
}

/// One authenticated backend to search.
///
/// Multiple handles may share a platform for one user (multi-account
/// mail). Handles are re-fetched per request and never cached across
/// pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHandle {
    /// Which platform this account belongs to
    pub platform: Platform,

    /// Stable account identifier within the credential store
    pub account_id: String,

    /// Human-readable label (address, handle, workspace name)
    pub display_label: String,

    /// Opaque credential reference
    pub auth: AuthContext,

    /// Optional base URL for building deep links into this account.
    ///
    /// Display detail only, never validated against session state.
    pub link_base: Option<String>,
}

impl AccountHandle {
    /// Create a new handle.
    pub fn new(
        platform: Platform,
        account_id: impl Into<String>,
        display_label: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            account_id: account_id.into(),
            display_label: display_label.into(),
            auth: AuthContext::default(),
            link_base: None,
        }
    }

    /// Attach a credential reference.
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    /// Set the deep-link base URL.
    pub fn with_link_base(mut self, base: impl Into<String>) -> Self {
        self.link_base = Some(base.into());
        self
    }
}
