//! Web search provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One ranked result from the search provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    /// Raw page text as returned by the provider; used as the snippet
    /// fallback when full-text fetching fails
    pub text: String,
    pub summary: Option<String>,
    pub published_date: Option<String>,
    pub author: Option<String>,
    pub highlights: Vec<String>,
}

/// Retry behavior for transient search failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRetryConfig {
    pub max_attempts: u32,
    /// Backoff in seconds is `backoff_factor ^ attempt`
    pub backoff_factor: f64,
}

impl Default for SearchRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_factor: 1.5,
        }
    }
}

impl SearchRetryConfig {
    /// Backoff duration before the given retry attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.backoff_factor.powi(attempt as i32))
    }
}

/// Trait for web search providers
///
/// Implementations are expected to retry transient failures with exponential
/// backoff and surface the last error once retries are exhausted.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web, returning up to `num_results` ranked hits
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>>;
}
