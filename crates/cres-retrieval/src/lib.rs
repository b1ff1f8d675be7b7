//! Web evidence collection and credibility-weighted retrieval for CRES
//!
//! This crate implements the evidence pipeline: web search with retry,
//! full-text fetching with snippet fallback, LLM-based credibility scoring,
//! an in-memory similarity index, and the hybrid retriever that blends
//! similarity with credibility.

mod chunk;
mod collector;
mod credibility;
mod fetch;
mod index;
mod retriever;
mod search;

pub use chunk::TextChunker;
pub use collector::{CollectedEvidence, CollectorConfig, EvidenceCollector};
pub use credibility::CredibilityScorer;
pub use fetch::PageFetcher;
pub use index::EvidenceIndex;
pub use retriever::{retrieve, RetrievalParams};
pub use search::{ExaClient, ExaConfig};

// Re-export core types for convenience
pub use cres_core::{
    Document, DocumentSource, Error, Result, SearchHit, SearchProvider, SearchRetryConfig,
};
