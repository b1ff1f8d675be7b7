//! Exa web search client with exponential-backoff retry

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use cres_core::{Error, Result, SearchHit, SearchProvider, SearchRetryConfig};

/// Configuration for the Exa search client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExaConfig {
    pub api_key: String,
    pub api_url: String,
}

impl ExaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("EXA_API_KEY").map_err(|_| {
            Error::Configuration("EXA_API_KEY environment variable not found".to_string())
        })?;

        let api_url = env::var("EXA_API_URL").unwrap_or_else(|_| "https://api.exa.ai".to_string());

        Ok(Self { api_key, api_url })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'static str,
    num_results: usize,
    contents: ContentsRequest,
}

#[derive(Serialize)]
struct ContentsRequest {
    text: bool,
    summary: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultItem {
    url: String,
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    highlights: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResultItem>,
}

/// Exa search API client
pub struct ExaClient {
    config: ExaConfig,
    retry: SearchRetryConfig,
    client: Client,
}

impl ExaClient {
    /// Create a new client from configuration
    pub fn new(config: ExaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            retry: SearchRetryConfig::default(),
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ExaConfig::from_env()?)
    }

    /// Override the retry configuration
    pub fn with_retry(mut self, retry: SearchRetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn perform_search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>> {
        let request_body = SearchRequest {
            query,
            search_type: "auto",
            num_results,
            contents: ContentsRequest {
                text: true,
                summary: true,
            },
        };

        let url = format!("{}/search", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::SearchProvider(format!(
                "search failed with status {}: {}",
                status, error_text
            )));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(data
            .results
            .into_iter()
            .map(|item| SearchHit {
                url: item.url,
                title: item.title,
                text: item.text.unwrap_or_default(),
                summary: item.summary,
                published_date: item.published_date,
                author: item.author,
                highlights: item.highlights.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for ExaClient {
    /// Search with exponential-backoff retry; the last error is surfaced
    /// once attempts are exhausted.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>> {
        let mut attempt = 0;

        loop {
            match self.perform_search(query, num_results).await {
                Ok(hits) => {
                    tracing::info!(query, hits = hits.len(), "search completed");
                    return Ok(hits);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(query, attempts = attempt, error = %e, "search retries exhausted");
                        return Err(e);
                    }
                    let backoff = self.retry.backoff(attempt);
                    tracing::info!(
                        query,
                        attempt,
                        backoff_secs = backoff.as_secs_f64(),
                        error = %e,
                        "search attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_is_camel_case() {
        let request = SearchRequest {
            query: "acme revenue",
            search_type: "auto",
            num_results: 15,
            contents: ContentsRequest {
                text: true,
                summary: true,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["numResults"], 15);
        assert_eq!(value["type"], "auto");
        assert_eq!(value["contents"]["text"], true);
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let raw = r#"{"results": [{"url": "https://example.com", "title": null}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert!(parsed.results[0].text.is_none());
    }
}
