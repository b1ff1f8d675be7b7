//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use cres_core::{Error, GenerationConfig, LlmProvider, Result};

use crate::config::OpenAiConfig;

/// OpenAI chat completions client
pub struct OpenAiClient {
    config: OpenAiConfig,
    generation: GenerationConfig,
    client: Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let generation = GenerationConfig {
            model_id: config.model_id.clone(),
            ..GenerationConfig::default()
        };

        let client = Client::builder()
            .timeout(generation.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            generation,
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    /// Override the generation configuration
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    async fn perform_chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        let request_body = ChatRequest {
            model: &self.generation.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("chat completion timed out: {}", e))
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LlmProvider(format!(
                "chat completion failed with status {}: {}",
                status, error_text
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::LlmProvider("empty chat completion response".to_string()))?;

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.generation.model_id, "chat completion");
        self.perform_chat(system_prompt, user_prompt, false).await
    }

    async fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<serde_json::Value> {
        tracing::debug!(model = %self.generation.model_id, "structured chat completion");
        let content = self.perform_chat(system_prompt, user_prompt, true).await?;

        serde_json::from_str(&content).map_err(|e| {
            Error::LlmProvider(format!("provider returned non-JSON content: {}", e))
        })
    }

    fn model_id(&self) -> &str {
        &self.generation.model_id
    }
}
