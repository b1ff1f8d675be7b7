//! Credibility-weighted hybrid retrieval

use cres_core::{Document, DocumentSource};

use crate::index::EvidenceIndex;

/// First-party trust prior applied to non-web documents
const LOCAL_CREDIBILITY: f32 = 0.9;

/// Parameters for hybrid retrieval
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Nearest neighbours pulled from the index before filtering
    pub k_init: usize,
    /// Maximum documents returned after ranking
    pub k_final: usize,
    /// Documents below this credibility are dropped
    pub min_credibility: f32,
    /// Weight of similarity versus credibility in the hybrid score
    pub alpha: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            k_init: 30,
            k_final: 15,
            min_credibility: 0.5,
            alpha: 0.5,
        }
    }
}

/// Retrieve the best-ranked documents for a query.
///
/// Non-web documents always get credibility 0.9 before the filter runs. The
/// hybrid score keeps the credibility term scaled by 5 relative to the
/// similarity term; the upstream ranking behaves this way and results are
/// tuned against it.
pub fn retrieve(index: &EvidenceIndex, query: &str, params: &RetrievalParams) -> Vec<Document> {
    let hits = index.query(query, params.k_init);

    let mut survivors: Vec<(Document, f32)> = hits
        .into_iter()
        .map(|(mut doc, distance)| {
            if doc.source != DocumentSource::Web {
                doc.credibility = Some(LOCAL_CREDIBILITY);
            }
            (doc, distance)
        })
        .filter(|(doc, _)| doc.credibility.unwrap_or(0.0) >= params.min_credibility)
        .collect();

    let alpha = params.alpha;
    let hybrid = |doc: &Document, distance: f32| -> f32 {
        (1.0 - alpha) * (doc.credibility.unwrap_or(0.0) / 5.0) + alpha * (1.0 - distance)
    };

    survivors.sort_by(|a, b| {
        hybrid(&b.0, b.1)
            .partial_cmp(&hybrid(&a.0, a.1))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let keep = params.k_final.min(survivors.len());
    survivors
        .into_iter()
        .take(keep)
        .map(|(doc, _)| doc)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TextChunker;
    use cres_core::Document;

    fn build_index(docs: &[Document]) -> EvidenceIndex {
        EvidenceIndex::build(docs, &TextChunker::default())
    }

    #[test]
    fn test_min_credibility_filter() {
        let docs = vec![
            Document::web("https://a.example.com", "a", "acme revenue report")
                .with_credibility(0.3),
            Document::web("https://b.example.com", "b", "acme revenue filing")
                .with_credibility(0.8),
            Document::web("https://c.example.com", "c", "acme revenue disclosure")
                .with_credibility(0.6),
        ];
        let index = build_index(&docs);

        let results = retrieve(&index, "acme revenue", &RetrievalParams::default());

        assert!(!results.is_empty());
        for doc in &results {
            assert!(doc.credibility.unwrap() >= 0.5);
            assert_ne!(doc.url, "https://a.example.com");
        }
    }

    #[test]
    fn test_non_web_documents_get_trust_prior() {
        // Local doc scored low by a previous pass; the prior must overwrite it
        let docs = vec![{
            let mut doc = Document::local("internal report", "acme revenue internal figures");
            doc.credibility = Some(0.1);
            doc
        }];
        let index = build_index(&docs);

        let results = retrieve(&index, "acme revenue", &RetrievalParams::default());

        // Survives the 0.5 filter because the 0.9 prior is applied first
        assert!(!results.is_empty());
        assert_eq!(results[0].credibility, Some(0.9));
    }

    #[test]
    fn test_unscored_web_documents_are_dropped() {
        let docs = vec![Document::web("https://a.example.com", "a", "acme revenue")];
        let index = build_index(&docs);

        let results = retrieve(&index, "acme revenue", &RetrievalParams::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_k_final_cap() {
        let docs: Vec<Document> = (0..10)
            .map(|i| {
                Document::web(
                    format!("https://{i}.example.com"),
                    "t",
                    "acme revenue figures",
                )
                .with_credibility(0.8)
            })
            .collect();
        let index = build_index(&docs);

        let params = RetrievalParams {
            k_final: 3,
            ..RetrievalParams::default()
        };
        let results = retrieve(&index, "acme revenue", &params);
        assert!(results.len() <= 3);
    }

    #[test]
    fn test_empty_survivors_yield_empty_result() {
        let docs = vec![
            Document::web("https://a.example.com", "a", "acme revenue").with_credibility(0.1),
        ];
        let index = build_index(&docs);

        let params = RetrievalParams {
            min_credibility: 0.9,
            ..RetrievalParams::default()
        };
        assert!(retrieve(&index, "acme revenue", &params).is_empty());
    }

    #[test]
    fn test_ranking_prefers_similar_and_credible() {
        let docs = vec![
            Document::web("https://relevant.example.com", "a", "acme corp 2023 revenue report")
                .with_credibility(0.9),
            Document::web("https://offtopic.example.com", "b", "gardening tips for spring")
                .with_credibility(0.9),
        ];
        let index = build_index(&docs);

        let results = retrieve(&index, "acme corp 2023 revenue", &RetrievalParams::default());
        assert!(!results.is_empty());
        assert_eq!(results[0].url, "https://relevant.example.com");
    }
}
