//! Crawler module for page discovery and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching for seeding and the static renderer
//! - Seed discovery from sitemaps and robots.txt
//! - The per-page render and extraction pipeline
//! - Adaptive concurrency
//! - Overall crawl coordination

mod coordinator;
mod extractor;
pub(crate) mod fetcher;
mod governor;
mod pipeline;
mod seeds;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use extractor::{extract_content, extract_links, ExtractedContent, Heading, ImageKind, ImageRef};
pub use fetcher::{build_http_client, fetch_html, fetch_url, FetchResult};
pub use governor::{Governor, PageSignal};
pub use pipeline::{process, PageOutput, PipelineOptions, SUPPRESSED_SELECTORS};
pub use seeds::{discover_seeds, extract_locs, SeedDiscoverer, SeedDiscovery, SITEMAP_PATHS};
