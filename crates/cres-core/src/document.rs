//! Evidence document type shared across the retrieval pipeline

use serde::{Deserialize, Serialize};

/// Where a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    /// Fetched from a web search result
    Web,
    /// First-party/local material (reports, uploaded files)
    Local,
}

/// A piece of evidence considered during answer generation.
///
/// Documents are created by the web evidence collector, enriched in place by
/// the credibility scorer, and consumed read-only by the retriever and the
/// answer generator. They live only as long as the session state that owns
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
    pub published_date: Option<String>,
    pub author: Option<String>,
    pub highlights: Vec<String>,
    /// Trust score in [0, 1]; unset until the credibility scorer has run
    pub credibility: Option<f32>,
    pub source: DocumentSource,
    /// Date the document was collected (YYYY-MM-DD)
    pub fetched_at: Option<String>,
}

impl Document {
    /// Create a web document with credibility not yet assigned
    pub fn web(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            published_date: None,
            author: None,
            highlights: Vec::new(),
            credibility: None,
            source: DocumentSource::Web,
            fetched_at: None,
        }
    }

    /// Create a local (first-party) document
    pub fn local(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            title: title.into(),
            text: text.into(),
            published_date: None,
            author: None,
            highlights: Vec::new(),
            credibility: None,
            source: DocumentSource::Local,
            fetched_at: None,
        }
    }

    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_credibility(mut self, credibility: f32) -> Self {
        self.credibility = Some(credibility);
        self
    }
}

/// Collapse all runs of whitespace into single spaces.
///
/// Applied to snippet fallbacks and extracted page text so that evidence
/// handed to the index and the prompts is single-line.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
