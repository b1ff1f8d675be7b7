//! Core traits and types for CRES (Company RESearch engine)
//!
//! This crate defines the fundamental traits and types used across the CRES
//! system. It provides capability-facing interfaces for LLM providers, web
//! search providers, and session checkpoint stores, making the system
//! test-friendly and extensible.

pub mod answer;
pub mod document;
pub mod error;
pub mod llm;
pub mod search;
pub mod session;

pub use answer::{CompanyMetric, Generation, MetricValue};
pub use document::{normalize_whitespace, Document, DocumentSource};
pub use error::{Error, Result};
pub use llm::{generate_structured, GenerationConfig, LlmProvider};
pub use search::{SearchHit, SearchProvider, SearchRetryConfig};
pub use session::{SessionState, SessionStore};
