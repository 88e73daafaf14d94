//! Configuration for search and signal-scan pipelines.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the fan-out search pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Messages fetched in full detail per account. Default: 20.
    pub per_account_limit: usize,

    /// Upper bound on the initial list/search call. Default: 50.
    pub list_cap: usize,

    /// Per-platform cap in the citation set of the final response.
    ///
    /// Full per-platform results are preserved for "show more";
    /// this only bounds the cited sources. Default: 5.
    pub response_cap: usize,

    /// Maximum concurrent in-flight platform calls. Default: 8.
    pub max_concurrency: usize,

    /// Body preview length in characters. Default: 1500.
    pub preview_chars: usize,

    /// Maximum retained buffer size for incremental re-sync merges.
    ///
    /// Default: 1000.
    pub resync_retain: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_account_limit: 20,
            list_cap: 50,
            response_cap: 5,
            max_concurrency: 8,
            preview_chars: 1500,
            resync_retain: 1000,
        }
    }
}

impl SearchConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-account detail-fetch limit.
    pub fn with_per_account_limit(mut self, limit: usize) -> Self {
        self.per_account_limit = limit;
        self
    }

    /// Set the per-platform citation cap.
    pub fn with_response_cap(mut self, cap: usize) -> Self {
        self.response_cap = cap;
        self
    }

    /// Set the concurrency cap.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }
}

/// Configuration for the signal extraction scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Documents analyzed concurrently per batch. Default: 3.
    pub batch_size: usize,

    /// Pause between batches, for backend rate limits. Default: 200ms.
    pub batch_delay_ms: u64,

    /// Per-document analysis deadline. Default: 8s.
    pub doc_timeout_secs: u64,

    /// Lookback window for recent documents. Default: 3 days.
    pub lookback_days: i64,

    /// Document cap per account. Default: 10.
    pub per_account_docs: usize,

    /// Signals below this importance are dropped. Default: 6.
    pub min_importance: u8,

    /// Documents with shorter bodies are skipped. Default: 50 chars.
    pub min_body_chars: usize,

    /// Full-body fetch only when the snippet is shorter than this.
    ///
    /// Default: 100 chars.
    pub snippet_fetch_threshold: usize,

    /// Extra raw signals accumulated beyond the requested limit
    /// before scanning stops. Default: 2.
    pub overscan: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_delay_ms: 200,
            doc_timeout_secs: 8,
            lookback_days: 3,
            per_account_docs: 10,
            min_importance: 6,
            min_body_chars: 50,
            snippet_fetch_threshold: 100,
            overscan: 2,
        }
    }
}

impl ScanConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-document deadline as a `Duration`.
    pub fn doc_timeout(&self) -> Duration {
        Duration::from_secs(self.doc_timeout_secs)
    }

    /// The inter-batch pause as a `Duration`.
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the inter-batch delay in milliseconds.
    pub fn with_batch_delay_ms(mut self, ms: u64) -> Self {
        self.batch_delay_ms = ms;
        self
    }

    /// Set the per-document timeout in seconds.
    pub fn with_doc_timeout_secs(mut self, secs: u64) -> Self {
        self.doc_timeout_secs = secs;
        self
    }

    /// Set the importance floor.
    pub fn with_min_importance(mut self, min: u8) -> Self {
        self.min_importance = min;
        self
    }

    /// Set the per-account document cap.
    pub fn with_per_account_docs(mut self, cap: usize) -> Self {
        self.per_account_docs = cap;
        self
    }
}
