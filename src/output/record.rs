//! Records emitted by the crawl
//!
//! An [`ExtractionRecord`] is built once per successfully processed page and
//! is never modified after it reaches the sink. Failed pages produce a
//! [`FailureRecord`] instead.

use crate::crawler::{ExtractedContent, Heading, ImageRef};
use crate::render::Stability;
use crate::state::{CrawlRequest, RequestOrigin};
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// Structured content extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    /// Canonical URL that was requested (the frontier key)
    pub url: String,

    /// URL the page ended up at after redirects
    pub final_url: String,

    pub depth: u32,
    pub origin: RequestOrigin,
    pub title: Option<String>,
    pub description: Option<String>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,

    /// Accepted in-scope links found on the page, sorted
    pub discovered_links: Vec<String>,

    /// True when the page was extracted before its DOM settled
    pub stability_timed_out: bool,

    pub crawled_at: DateTime<Utc>,
}

impl ExtractionRecord {
    /// Assembles a record from a finished pipeline run
    pub fn new(
        request: &CrawlRequest,
        final_url: &Url,
        content: ExtractedContent,
        discovered_links: Vec<String>,
        stability: Stability,
    ) -> Self {
        Self {
            url: request.url.to_string(),
            final_url: final_url.to_string(),
            depth: request.depth,
            origin: request.origin,
            title: content.title,
            description: content.description,
            headings: content.headings,
            paragraphs: content.paragraphs,
            images: content.images,
            discovered_links,
            stability_timed_out: stability.timed_out(),
            crawled_at: Utc::now(),
        }
    }
}

/// A page whose pipeline failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub url: String,
    pub depth: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(request: &CrawlRequest, error: impl ToString) -> Self {
        Self {
            url: request.url.to_string(),
            depth: request.depth,
            error: error.to_string(),
            failed_at: Utc::now(),
        }
    }
}
