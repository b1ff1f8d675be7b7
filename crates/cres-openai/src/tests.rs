//! Tests for the OpenAI client

use crate::{LlmProvider, OpenAiClient, OpenAiConfig};

#[test]
fn test_explicit_config() {
    let config = OpenAiConfig::new("test_key".to_string(), "gpt-4o".to_string());
    assert_eq!(config.api_url, "https://api.openai.com/v1");
    assert_eq!(config.model_id, "gpt-4o");
}

#[test]
fn test_client_uses_configured_model() {
    let config = OpenAiConfig::new("test_key".to_string(), "gpt-4o-mini".to_string());
    let client = OpenAiClient::new(config).unwrap();
    assert_eq!(client.model_id(), "gpt-4o-mini");
}
