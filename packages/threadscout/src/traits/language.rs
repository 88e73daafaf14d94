//! Language backend trait.
//!
//! The backend is an opaque function: text in, text out. It is
//! treated as unreliable (may error, may return malformed JSON, may
//! return nothing) and every call site in the pipeline defines its
//! own fallback.

use async_trait::async_trait;

use crate::error::LanguageResult;

/// Seam to the natural-language backend.
///
/// Implementations wrap a specific provider and handle transport;
/// prompting and response parsing live in the pipeline.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    /// One completion call.
    ///
    /// `system` carries the fixed instruction prompt, `user` the
    /// request-specific text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> LanguageResult<String>;
}
