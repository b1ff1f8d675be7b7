//! In-memory similarity index over chunked document text

use cres_core::Document;

use crate::chunk::TextChunker;

struct IndexEntry {
    /// Position of the parent document in the source slice
    doc_idx: usize,
    content: String,
}

/// Similarity index built fresh for each retrieval pass.
///
/// Both whole documents and their overlapping chunks are indexed; queries
/// return chunk-level views of the parent document so that downstream
/// ranking sees the parent's metadata (credibility, source, url) on every
/// hit.
pub struct EvidenceIndex {
    documents: Vec<Document>,
    entries: Vec<IndexEntry>,
}

impl EvidenceIndex {
    /// Build an index over the given documents
    pub fn build(documents: &[Document], chunker: &TextChunker) -> Self {
        let mut entries = Vec::new();

        for (doc_idx, doc) in documents.iter().enumerate() {
            entries.push(IndexEntry {
                doc_idx,
                content: doc.text.clone(),
            });
            for chunk in chunker.chunk(&doc.text) {
                entries.push(IndexEntry {
                    doc_idx,
                    content: chunk,
                });
            }
        }

        Self {
            documents: documents.to_vec(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Query for the `k` nearest entries.
    ///
    /// Returns chunk-level documents paired with a raw distance in [0, 1],
    /// smaller meaning more similar, ordered nearest first.
    pub fn query(&self, text: &str, k: usize) -> Vec<(Document, f32)> {
        let mut scored: Vec<(usize, &str, f32)> = self
            .entries
            .iter()
            .map(|entry| {
                let distance = 1.0 - Self::text_similarity(text, &entry.content);
                (entry.doc_idx, entry.content.as_str(), distance)
            })
            .collect();

        scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(doc_idx, content, distance)| {
                let mut doc = self.documents[doc_idx].clone();
                doc.text = content.to_string();
                (doc, distance)
            })
            .collect()
    }

    /// Word-overlap similarity in [0, 1] between a query and entry content
    fn text_similarity(query: &str, content: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let content_lower = content.to_lowercase();

        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return 0.0;
        }

        let matches = query_words
            .iter()
            .filter(|word| content_lower.contains(**word))
            .count();

        matches as f32 / query_words.len() as f32
    }
}
