//! Shared helpers for the integration tests
//!
//! `ScriptedRenderer` serves pages from an in-memory map so crawl behavior
//! can be tested without a network or a browser.

#![allow(dead_code)]

use async_trait::async_trait;
use sitewalk::config::{Config, CrawlerConfig, OutputConfig, OutputFormat, UserAgentConfig};
use sitewalk::render::{NavigationError, RenderedPage, Renderer, Stability};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// How the scripted backend answers a navigation
#[derive(Debug, Clone)]
pub enum Script {
    /// Serves this HTML and settles immediately
    Html(String),
    /// Fails with a network error
    Fail,
    /// Never finishes navigating
    Hang,
    /// Lands on another scripted URL, like a server-side redirect
    Redirect(String),
    /// Navigates, then panics when the DOM is read
    Panic,
}

/// In-memory renderer keyed by canonical URL
#[derive(Debug, Clone, Default)]
pub struct ScriptedRenderer {
    pages: Arc<HashMap<String, Script>>,
    navigations: Arc<Mutex<Vec<String>>>,
    delay: Duration,
    open: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    pub fn new(pages: Vec<(&str, Script)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, script)| (url.to_string(), script))
                    .collect(),
            ),
            navigations: Arc::default(),
            delay: Duration::ZERO,
            open: Arc::default(),
            peak: Arc::default(),
        }
    }

    /// Makes every navigation take `delay`, so page contexts overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Most page contexts that were ever open at the same time
    pub fn peak_open(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>, NavigationError> {
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            renderer: self.clone(),
            html: None,
            panics: false,
        }))
    }
}

struct ScriptedPage {
    renderer: ScriptedRenderer,
    html: Option<String>,
    panics: bool,
}

impl Drop for ScriptedPage {
    fn drop(&mut self) {
        self.renderer.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderedPage for ScriptedPage {
    async fn navigate(&mut self, url: &Url) -> Result<Url, NavigationError> {
        self.renderer
            .navigations
            .lock()
            .unwrap()
            .push(url.to_string());
        if !self.renderer.delay.is_zero() {
            tokio::time::sleep(self.renderer.delay).await;
        }

        match self.renderer.pages.get(url.as_str()) {
            Some(Script::Html(html)) => {
                self.html = Some(html.clone());
                Ok(url.clone())
            }
            Some(Script::Redirect(target)) => match self.renderer.pages.get(target.as_str()) {
                Some(Script::Html(html)) => {
                    self.html = Some(html.clone());
                    Url::parse(target).map_err(|e| NavigationError::Network(e.to_string()))
                }
                _ => Err(NavigationError::HttpStatus(404)),
            },
            Some(Script::Panic) => {
                self.html = Some(String::new());
                self.panics = true;
                Ok(url.clone())
            }
            Some(Script::Fail) => Err(NavigationError::Network("connection refused".to_string())),
            Some(Script::Hang) => std::future::pending().await,
            None => Err(NavigationError::HttpStatus(404)),
        }
    }

    async fn await_stable(&mut self, _timeout: Duration) -> Stability {
        Stability::Stable
    }

    async fn suppress(&mut self, _selectors: &[&str]) {}

    async fn content(&mut self) -> Result<String, NavigationError> {
        if self.panics {
            panic!("scripted renderer crashed while reading the DOM");
        }
        self.html
            .clone()
            .ok_or_else(|| NavigationError::Unavailable("no document".to_string()))
    }
}

/// A page with a heading, one paragraph and the given links
pub fn page(title: &str, links: &[&str]) -> Script {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    Script::Html(format!(
        "<html><head><title>{title}</title></head><body><main><h1>{title}</h1>\
         <p>This paragraph about {title} is long enough to keep.</p>{anchors}</main></body></html>"
    ))
}

/// A configuration for `scope` that writes JSON into `dir`
///
/// Concurrency is pinned to a single worker so page order is deterministic.
pub fn test_config(scope: &str, seeds: &[&str], dir: &std::path::Path) -> Config {
    test_config_with_workers(scope, seeds, dir, 1, 1)
}

/// Like [`test_config`], with explicit worker bounds
pub fn test_config_with_workers(
    scope: &str,
    seeds: &[&str],
    dir: &std::path::Path,
    min: u32,
    max: u32,
) -> Config {
    let mut crawler = CrawlerConfig::new(scope, seeds.iter().map(|s| s.to_string()).collect());
    crawler.min_concurrency = Some(min);
    crawler.max_concurrency = Some(max);
    crawler.use_sitemap = false;
    crawler.min_paragraph_length = 10;
    crawler.per_request_timeout = 1_000;
    crawler.navigation_timeout = 60_000;

    Config {
        crawler,
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            results_path: dir.join("results.json").display().to_string(),
            links_path: Some(dir.join("links.txt").display().to_string()),
            format: OutputFormat::Json,
        },
    }
}

/// Reads the JSON results document
pub fn read_results(dir: &std::path::Path) -> serde_json::Value {
    let contents = std::fs::read_to_string(dir.join("results.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

/// The `url` field of every record in the results document
pub fn record_urls(results: &serde_json::Value) -> Vec<String> {
    results["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["url"].as_str().unwrap().to_string())
        .collect()
}
