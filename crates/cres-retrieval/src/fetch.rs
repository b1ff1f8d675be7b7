//! Full-text fetching with per-document fallback to search snippets

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use cres_core::{normalize_whitespace, Error, Result};

/// Documents larger than this are not fetched at all
const MAX_CONTENT_LENGTH: u64 = 50_000_000;

/// PDFs with more pages than this are treated as unextractable
const MAX_PDF_PAGES: usize = 50;

const STRIPPED_TAGS: [&str; 5] = ["header", "footer", "nav", "script", "style"];

const MAIN_CONTENT_SELECTOR: &str = "main, article, div.content, div.main-content, \
     div.article-content, div.post-content, div.entry-content";

/// Fetches page content and extracts readable text.
///
/// Never raises to its caller: every failure path returns the
/// whitespace-normalized search snippet instead.
pub struct PageFetcher {
    client: Client,
    head_timeout: Duration,
    fetch_timeout: Duration,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            head_timeout: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(20),
        })
    }

    /// Override the probe and fetch timeouts
    pub fn with_timeouts(mut self, head_timeout: Duration, fetch_timeout: Duration) -> Self {
        self.head_timeout = head_timeout;
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Fetch the full text of a URL, falling back to the search snippet on
    /// any failure (network, timeout, oversized content, parse error).
    pub async fn fetch_full_text(&self, url: &str, fallback_snippet: &str) -> String {
        tracing::info!(url, "fetching full text");

        if self.exceeds_size_limit(url).await {
            tracing::info!(url, "content too large, using snippet");
            return normalize_whitespace(fallback_snippet);
        }

        match self.fetch_and_extract(url).await {
            Ok(Some(text)) => normalize_whitespace(&text),
            Ok(None) => {
                tracing::info!(url, "no text extracted, using snippet");
                normalize_whitespace(fallback_snippet)
            }
            Err(e) => {
                tracing::info!(url, error = %e, "fetch failed, using snippet");
                normalize_whitespace(fallback_snippet)
            }
        }
    }

    /// HEAD-probe the content length; probe failures do not block the fetch
    async fn exceeds_size_limit(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
        {
            Ok(response) => response
                .content_length()
                .map(|length| length > MAX_CONTENT_LENGTH)
                .unwrap_or(false),
            Err(e) => {
                tracing::info!(url, error = %e, "head probe failed");
                false
            }
        }
    }

    async fn fetch_and_extract(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("fetch timed out: {}", e))
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        let status = response.status();

        if content_type.contains("application/pdf") && status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            return tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, MAX_PDF_PAGES))
                .await
                .map_err(|e| Error::Other(e.to_string()));
        }

        let main_content = is_html_url(url) || content_type.contains("text/html");
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            if main_content {
                extract_html_main(&body)
            } else {
                extract_visible_text(&body)
            }
        })
        .await
        .map_err(|e| Error::Other(e.to_string()))
    }
}

/// Whether the URL path names an HTML resource
fn is_html_url(raw: &str) -> bool {
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw.to_string(),
    };
    path.ends_with(".html") || path.ends_with(".htm")
}

/// Extract main-content text from an HTML document.
///
/// Prefers a recognized main-content container, then `<body>`, then the
/// whole document. Header, footer, nav, script and style subtrees are
/// excluded everywhere.
fn extract_html_main(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let main_selector = Selector::parse(MAIN_CONTENT_SELECTOR).ok()?;
    if let Some(main) = document.select(&main_selector).next() {
        return non_blank(visible_text(main));
    }

    let body_selector = Selector::parse("body").ok()?;
    if let Some(body) = document.select(&body_selector).next() {
        return non_blank(visible_text(body));
    }

    non_blank(visible_text(document.root_element()))
}

/// Extract all visible text from a document; generic fallback for
/// resources that are neither PDFs nor recognizably HTML pages.
fn extract_visible_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    non_blank(visible_text(document.root_element()))
}

fn visible_text(root: ElementRef) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let stripped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|element| STRIPPED_TAGS.contains(&element.name()))
                    .unwrap_or(false)
            });
            if !stripped {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
        }
    }

    parts.join(" ")
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extract text from PDF bytes; PDFs over the page cap yield nothing
fn extract_pdf_text(bytes: &[u8], max_pages: usize) -> Option<String> {
    let document = lopdf::Document::load_mem(bytes).ok()?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.len() > max_pages {
        return None;
    }

    let mut texts = Vec::new();
    for page in pages {
        if let Ok(text) = document.extract_text(&[page]) {
            if !text.trim().is_empty() {
                texts.push(text);
            }
        }
    }

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}
