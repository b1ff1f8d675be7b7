//! OpenAI client configuration

use cres_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model_id: String,
}

impl OpenAiConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Configuration("OPENAI_API_KEY environment variable not found".to_string())
        })?;

        let api_url =
            env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let model_id = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            api_key,
            api_url,
            model_id,
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String, model_id: String) -> Self {
        Self {
            api_key,
            api_url: "https://api.openai.com/v1".to_string(),
            model_id,
        }
    }
}
