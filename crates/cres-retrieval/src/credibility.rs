//! LLM-based credibility scoring for web documents

use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;

use cres_core::{generate_structured, Document, LlmProvider, Result};

/// Snippet length handed to the grader prompt
const SNIPPET_CHARS: usize = 5000;

const SYSTEM_PROMPT: &str = "You are an expert fact-checker and researcher. You will be given a URL as well as some URL metadata.
Your task is to evaluate the credibility of the content of the given URL.

**Instructions:**
**Credibility Score (`credibility_score`)**:
    - Base this score (0.0 to 1.0) on:
        - Domain reliability (peer-reviewed, official, or trusted news source).
        - Author expertise (e.g., known expert vs. anonymous).
        - Recency (fresher content gets a higher score unless older info is more authoritative).

Respond with a JSON object: {\"credibility_score\": <float between 0.0 and 1.0>}";

#[derive(Debug, Deserialize)]
struct CredibilityGrade {
    credibility_score: f32,
}

/// Assigns a trust score in [0, 1] to retrieved documents
pub struct CredibilityScorer<L: LlmProvider> {
    llm: Arc<L>,
}

impl<L: LlmProvider> CredibilityScorer<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Score one document against the query context.
    ///
    /// Pure with respect to the document; the caller writes the score back.
    pub async fn score(&self, question: &str, doc: &Document) -> Result<f32> {
        let snippet: String = doc.text.chars().take(SNIPPET_CHARS).collect();
        let user_prompt = format!(
            "Query: '{question}'\nPublication Date: '{date}'\nAuthor: '{author}'\nSnippet: '{snippet}'\nURL: {url}",
            question = question,
            date = doc.published_date.as_deref().unwrap_or("None"),
            author = doc.author.as_deref().unwrap_or("None"),
            snippet = snippet,
            url = doc.url,
        );

        let grade: CredibilityGrade =
            generate_structured(self.llm.as_ref(), SYSTEM_PROMPT, &user_prompt).await?;
        Ok(grade.credibility_score.clamp(0.0, 1.0))
    }

    /// Score all documents concurrently, writing credibility in place.
    ///
    /// A failing call maps that document to credibility 0.0; it never blocks
    /// or fails the rest of the batch.
    pub async fn score_all(&self, question: &str, documents: &mut [Document]) {
        tracing::info!(count = documents.len(), "scoring document credibility");

        let tasks = documents
            .iter()
            .map(|doc| self.score(question, doc))
            .collect::<Vec<_>>();
        let scores = join_all(tasks).await;

        for (doc, score) in documents.iter_mut().zip(scores) {
            doc.credibility = Some(match score {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(url = %doc.url, error = %e, "credibility grading failed");
                    0.0
                }
            });
        }
    }
}
