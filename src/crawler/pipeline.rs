//! Per-page pipeline
//!
//! One call processes one frontier request end to end:
//! open a page context, navigate under the navigation timeout, wait for the
//! DOM to settle, collect links, hide boilerplate, then extract content.

use crate::crawler::extractor::{extract_content, extract_links, ExtractedContent};
use crate::render::{NavigationError, RenderedPage, Renderer, Stability};
use crate::state::CrawlRequest;
use crate::SitewalkError;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Elements hidden before content extraction
///
/// Navigation chrome, scripts, inline data images and consent/alert
/// overlays never contribute to a record.
pub const SUPPRESSED_SELECTORS: &[&str] = &[
    "nav",
    "footer",
    "script",
    "style",
    "noscript",
    "svg",
    "img[src^=\"data:\"]",
    "[role=\"alert\"]",
    "[role=\"banner\"]",
    "[role=\"dialog\"]",
    "[role=\"alertdialog\"]",
    "[aria-modal=\"true\"]",
];

/// Extra time a backend gets beyond the stability timeout before the
/// pipeline stops waiting on it
const STABILITY_GRACE: Duration = Duration::from_millis(500);

/// Timeouts and thresholds applied to every page
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub navigation_timeout: Duration,
    pub stability_timeout: Duration,
    pub min_paragraph_length: usize,
}

/// Everything a successful visit produced
#[derive(Debug, Clone)]
pub struct PageOutput {
    /// URL after redirects; relative links resolve against it
    pub final_url: Url,
    pub content: ExtractedContent,
    /// Absolute outbound links, unfiltered
    pub links: Vec<String>,
    pub stability: Stability,
}

/// Runs the page pipeline for a single request
///
/// The page context is closed once the visit ends, successfully or not.
/// A stability timeout is not an error: the page is extracted from the DOM
/// as it stands and the output is flagged through `stability`.
///
/// # Errors
///
/// Returns `SitewalkError::Navigation` when the page context cannot be
/// opened, navigation fails or exceeds `navigation_timeout`, or the DOM
/// cannot be read.
pub async fn process(
    renderer: &dyn Renderer,
    request: &CrawlRequest,
    options: &PipelineOptions,
) -> Result<PageOutput, SitewalkError> {
    let navigation_error = |source| navigation_failure(request, source);

    let mut page = renderer.open_page().await.map_err(navigation_error)?;
    let result = visit(page.as_mut(), request, options).await;
    page.close().await;
    result
}

fn navigation_failure(request: &CrawlRequest, source: NavigationError) -> SitewalkError {
    SitewalkError::Navigation {
        url: request.url.to_string(),
        source,
    }
}

async fn visit(
    page: &mut dyn RenderedPage,
    request: &CrawlRequest,
    options: &PipelineOptions,
) -> Result<PageOutput, SitewalkError> {
    let navigation_error = |source| navigation_failure(request, source);

    let navigation = tokio::time::timeout(options.navigation_timeout, page.navigate(&request.url));
    let final_url = match navigation.await {
        Ok(result) => result.map_err(navigation_error)?,
        Err(_) => {
            return Err(navigation_error(NavigationError::Timeout(
                options.navigation_timeout,
            )))
        }
    };

    let stability = tokio::time::timeout(
        options.stability_timeout + STABILITY_GRACE,
        page.await_stable(options.stability_timeout),
    )
    .await
    .unwrap_or(Stability::TimedOut);

    if stability.timed_out() {
        warn!(
            "Page {} did not settle within {:?}; extracting current DOM",
            request.url, options.stability_timeout
        );
    }

    let raw = page.content().await.map_err(navigation_error)?;
    let links = extract_links(&raw, &final_url);

    page.suppress(SUPPRESSED_SELECTORS).await;
    let visible = page.content().await.map_err(navigation_error)?;
    let content = extract_content(&visible, &final_url, options.min_paragraph_length);

    debug!(
        "Extracted {} links, {} paragraphs, {} images from {}",
        links.len(),
        content.paragraphs.len(),
        content.images.len(),
        request.url
    );

    Ok(PageOutput {
        final_url,
        content,
        links,
        stability,
    })
}
