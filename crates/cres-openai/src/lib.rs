//! OpenAI integration for the CRES company-research engine
//!
//! This crate provides the OpenAI-compatible implementation of the
//! LlmProvider trait.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use cres_core::{Error, GenerationConfig, LlmProvider, Result};
