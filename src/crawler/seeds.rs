//! Seed discovery from sitemaps and robots.txt
//!
//! Before the crawl starts, the discoverer tries the well-known sitemap
//! locations of the scope origin, then robots.txt and any sitemaps it
//! declares. Every fetch is best effort: a missing or malformed document
//! contributes nothing and never aborts the run.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::fetch_url;
use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::Scope;
use crate::UrlResult;
use regex::Regex;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

/// Sitemap locations tried on every origin, in order
pub const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml"];

/// How many levels of nested sitemap indexes are followed
const MAX_SITEMAP_NESTING: u8 = 3;

static LOC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<loc>\s*(?:<!\[CDATA\[)?\s*(.*?)\s*(?:\]\]>)?\s*</loc>")
        .expect("hardcoded regex pattern is valid")
});

static SITEMAP_INDEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<sitemapindex[\s>]").expect("hardcoded regex pattern is valid"));

/// What seed discovery found
#[derive(Debug, Clone, Default)]
pub struct SeedDiscovery {
    /// Candidate page URLs, deduplicated, in discovery order
    pub urls: Vec<Url>,

    /// The origin's robots.txt, when one was served
    pub robots: Option<ParsedRobots>,
}

/// Finds initial crawl candidates for an origin
#[derive(Debug, Clone)]
pub struct SeedDiscoverer {
    client: Client,
}

impl SeedDiscoverer {
    /// Creates a discoverer over the run's HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches sitemaps and robots.txt for the origin
    ///
    /// The result may be empty; the configured seeds are enqueued regardless.
    pub async fn discover(&self, origin: &Url) -> SeedDiscovery {
        let mut sitemaps = SitemapQueue::default();
        let mut pages = PageSet::default();

        for path in SITEMAP_PATHS {
            if let Ok(sitemap_url) = origin.join(path) {
                sitemaps.push(sitemap_url, 0);
            }
        }
        self.drain(&mut sitemaps, &mut pages).await;

        let robots = fetch_robots(&self.client, origin).await;
        if let Some(robots) = &robots {
            for declared in robots.sitemaps() {
                match origin.join(&declared) {
                    Ok(sitemap_url) => sitemaps.push(sitemap_url, 0),
                    Err(e) => debug!("Ignoring robots.txt sitemap {}: {}", declared, e),
                }
            }
            self.drain(&mut sitemaps, &mut pages).await;
        }

        info!(
            "Seed discovery for {} found {} URLs",
            origin,
            pages.urls.len()
        );

        SeedDiscovery {
            urls: pages.urls,
            robots,
        }
    }

    async fn drain(&self, sitemaps: &mut SitemapQueue, pages: &mut PageSet) {
        while let Some((sitemap_url, nesting)) = sitemaps.pending.pop_front() {
            let Some(body) = fetch_url(&self.client, sitemap_url.as_str())
                .await
                .into_body()
            else {
                debug!("No sitemap at {}", sitemap_url);
                continue;
            };

            let locs = extract_locs(&body);
            debug!("Sitemap {} lists {} entries", sitemap_url, locs.len());

            if is_sitemap_index(&body) {
                if nesting >= MAX_SITEMAP_NESTING {
                    debug!("Not following sitemap index {} any deeper", sitemap_url);
                    continue;
                }
                for loc in locs {
                    if let Ok(child) = sitemap_url.join(&loc) {
                        sitemaps.push(child, nesting + 1);
                    }
                }
            } else {
                for loc in locs {
                    if let Ok(page) = sitemap_url.join(&loc) {
                        pages.insert(page);
                    }
                }
            }
        }
    }
}

/// Runs the seeding steps the configuration asks for
///
/// With `use-sitemap` off, only robots.txt is fetched, and only when the
/// crawl must respect it.
pub async fn discover_seeds(config: &CrawlerConfig, client: &Client) -> UrlResult<SeedDiscovery> {
    let scope = Scope::parse(&config.domain_scope, config.include_subdomains)?;

    if config.use_sitemap {
        return Ok(SeedDiscoverer::new(client.clone())
            .discover(scope.origin())
            .await);
    }

    let robots = if config.respect_robots_txt {
        fetch_robots(client, scope.origin()).await
    } else {
        None
    };

    Ok(SeedDiscovery {
        urls: Vec::new(),
        robots,
    })
}

#[derive(Default)]
struct SitemapQueue {
    pending: VecDeque<(Url, u8)>,
    seen: HashSet<String>,
}

impl SitemapQueue {
    fn push(&mut self, url: Url, nesting: u8) {
        if self.seen.insert(url.as_str().to_string()) {
            self.pending.push_back((url, nesting));
        }
    }
}

#[derive(Default)]
struct PageSet {
    urls: Vec<Url>,
    seen: HashSet<String>,
}

impl PageSet {
    fn insert(&mut self, url: Url) {
        if self.seen.insert(url.as_str().to_string()) {
            self.urls.push(url);
        }
    }
}

/// Extracts every `<loc>` value of a sitemap document
///
/// XML entities in the values are decoded. Documents that are not XML
/// simply yield nothing.
///
/// # Example
///
/// ```
/// use sitewalk::crawler::extract_locs;
///
/// let xml = "<urlset><url><loc>https://example.com/a?x=1&amp;y=2</loc></url></urlset>";
/// assert_eq!(extract_locs(xml), vec!["https://example.com/a?x=1&y=2"]);
/// ```
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC_REGEX
        .captures_iter(xml)
        .filter_map(|capture| capture.get(1))
        .map(|m| decode_entities(m.as_str()))
        .filter(|loc| !loc.is_empty())
        .collect()
}

fn is_sitemap_index(xml: &str) -> bool {
    SITEMAP_INDEX_REGEX.is_match(xml)
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_locs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
              <url><LOC>
                  https://example.com/about
              </LOC></url>
              <url><loc><![CDATA[https://example.com/cdata]]></loc></url>
              <url><loc></loc></url>
            </urlset>"#;

        assert_eq!(
            extract_locs(xml),
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/cdata"
            ]
        );
    }

    #[test]
    fn test_extract_locs_from_garbage() {
        assert!(extract_locs("<html><body>Not found</body></html>").is_empty());
        assert!(extract_locs("").is_empty());
    }

    #[test]
    fn test_sitemap_index_detection() {
        assert!(is_sitemap_index(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
        ));
        assert!(!is_sitemap_index("<urlset>"));
    }
}
