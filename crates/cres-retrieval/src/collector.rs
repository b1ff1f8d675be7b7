//! Web evidence collection: search, fetch, score, index, retrieve

use futures::future::join_all;
use std::sync::Arc;

use cres_core::{Document, LlmProvider, Result, SearchProvider};

use crate::chunk::TextChunker;
use crate::credibility::CredibilityScorer;
use crate::fetch::PageFetcher;
use crate::index::EvidenceIndex;
use crate::retriever::{retrieve, RetrievalParams};

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Search results requested per query
    pub num_results: usize,
    pub chunker: TextChunker,
    pub retrieval: RetrievalParams,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            num_results: 15,
            chunker: TextChunker::default(),
            retrieval: RetrievalParams::default(),
        }
    }
}

/// Evidence produced by one collection pass
#[derive(Debug, Clone, Default)]
pub struct CollectedEvidence {
    /// Ranked evidence in scope for generation, best first
    pub documents: Vec<Document>,
    /// All scored search hits, kept for traceability
    pub web_results: Vec<Document>,
}

/// Collects web evidence for a query.
///
/// Runs the search provider, fetches full text per result, scores
/// credibility, builds a fresh in-memory index and retrieves the
/// best-ranked evidence.
pub struct EvidenceCollector<S: SearchProvider, L: LlmProvider> {
    search: Arc<S>,
    scorer: CredibilityScorer<L>,
    fetcher: PageFetcher,
    config: CollectorConfig,
}

impl<S: SearchProvider, L: LlmProvider> EvidenceCollector<S, L> {
    pub fn new(search: Arc<S>, llm: Arc<L>, fetcher: PageFetcher) -> Self {
        Self {
            search,
            scorer: CredibilityScorer::new(llm),
            fetcher,
            config: CollectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Collect evidence for a query.
    ///
    /// Per-document fetches and credibility gradings run concurrently and
    /// isolate their failures; only search exhaustion is fatal here. An
    /// empty search result set yields empty evidence, not an error.
    pub async fn collect(&self, query: &str) -> Result<CollectedEvidence> {
        let hits = self.search.search(query, self.config.num_results).await?;
        if hits.is_empty() {
            tracing::info!(query, "search returned no results");
            return Ok(CollectedEvidence::default());
        }

        tracing::info!(query, count = hits.len(), "fetching search results");
        let texts = join_all(
            hits.iter()
                .map(|hit| self.fetcher.fetch_full_text(&hit.url, &hit.text)),
        )
        .await;

        let mut web_results: Vec<Document> = hits
            .into_iter()
            .zip(texts)
            .map(|(hit, text)| {
                let mut doc = Document::web(hit.url, hit.title.unwrap_or_default(), text);
                doc.published_date = hit.published_date;
                doc.author = hit.author;
                doc.highlights = hit.highlights;
                doc.fetched_at = Some(chrono::Local::now().format("%Y-%m-%d").to_string());
                doc
            })
            .collect();

        self.scorer.score_all(query, &mut web_results).await;

        let index = EvidenceIndex::build(&web_results, &self.config.chunker);
        let documents = retrieve(&index, query, &self.config.retrieval);

        tracing::info!(
            query,
            evidence = documents.len(),
            scored = web_results.len(),
            "evidence collection complete"
        );

        Ok(CollectedEvidence {
            documents,
            web_results,
        })
    }
}
