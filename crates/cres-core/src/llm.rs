//! LLM provider trait and types

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Trait for LLM providers (e.g., OpenAI-compatible backends)
///
/// This trait defines the interface for the generation collaborator. The
/// workflow core depends only on this interface, never on a specific
/// model or vendor API.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate free text from a system prompt and a user prompt
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Generate a JSON object from a system prompt and a user prompt.
    ///
    /// The system prompt is expected to describe the required object shape;
    /// providers enforce JSON output where the backend supports it.
    async fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<serde_json::Value>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

/// Generate a JSON object and deserialize it into a typed output.
///
/// Free function rather than a trait method so that `LlmProvider` stays
/// object-safe.
pub async fn generate_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<T> {
    let value = provider.generate_json(system_prompt, user_prompt).await?;
    serde_json::from_value(value)
        .map_err(|e| Error::LlmProvider(format!("malformed structured output: {}", e)))
}
