//! sitewalk: a frontier-driven site crawler
//!
//! This crate crawls a single web domain breadth-first, seeding itself from
//! sitemaps and robots.txt, rendering each page through a pluggable renderer,
//! extracting structured content and flushing the results durably, even when
//! the run is interrupted.

pub mod config;
pub mod crawler;
pub mod output;
pub mod render;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for sitewalk operations
#[derive(Debug, Error)]
pub enum SitewalkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        source: render::NavigationError,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for sitewalk operations
pub type Result<T> = std::result::Result<T, SitewalkError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlerConfig};
pub use crawler::{Coordinator, CrawlOutcome};
pub use output::{ExtractionRecord, ResultSink};
pub use state::{CrawlRequest, Frontier, RequestOrigin};
pub use url::{accept, normalize_url, Rejection};
