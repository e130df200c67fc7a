//! Static-HTML renderer backed by reqwest
//!
//! Pages are fetched once on navigation and are settled as soon as they
//! arrive. Suppression removes matching elements from the parsed document
//! before it is serialized again.

use crate::crawler::fetcher::{fetch_html, FetchResult};
use crate::render::{NavigationError, RenderedPage, Renderer, Stability};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Renderer that serves each page context from a shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Creates a renderer over an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>, NavigationError> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            document: None,
            suppressed: Vec::new(),
        }))
    }
}

struct HttpPage {
    client: Client,
    document: Option<String>,
    suppressed: Vec<String>,
}

#[async_trait]
impl RenderedPage for HttpPage {
    async fn navigate(&mut self, url: &Url) -> Result<Url, NavigationError> {
        match fetch_html(&self.client, url.as_str()).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                self.document = Some(body);
                self.suppressed.clear();
                Ok(Url::parse(&final_url).unwrap_or_else(|_| url.clone()))
            }
            FetchResult::ContentMismatch { content_type } => {
                Err(NavigationError::NotHtml(content_type))
            }
            FetchResult::HttpError { status_code } => {
                Err(NavigationError::HttpStatus(status_code))
            }
            FetchResult::NetworkError { error } => Err(NavigationError::Network(error)),
        }
    }

    async fn await_stable(&mut self, _timeout: Duration) -> Stability {
        // A static document cannot change after it has been received.
        Stability::Stable
    }

    async fn suppress(&mut self, selectors: &[&str]) {
        self.suppressed
            .extend(selectors.iter().map(|s| s.to_string()));
    }

    async fn content(&mut self) -> Result<String, NavigationError> {
        let document = self
            .document
            .as_deref()
            .ok_or_else(|| NavigationError::Unavailable("no document loaded".to_string()))?;

        if self.suppressed.is_empty() {
            return Ok(document.to_string());
        }

        Ok(strip_elements(document, &self.suppressed))
    }
}

/// Removes every element matching any selector and serializes the result
pub(crate) fn strip_elements(html: &str, selectors: &[String]) -> String {
    let mut document = Html::parse_document(html);

    let mut doomed = Vec::new();
    for raw in selectors {
        match Selector::parse(raw) {
            Ok(selector) => doomed.extend(document.select(&selector).map(|element| element.id())),
            Err(_) => debug!("Skipping invalid selector: {}", raw),
        }
    }

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.html()
}
