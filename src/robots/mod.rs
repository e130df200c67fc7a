//! Robots.txt handling module
//!
//! This module fetches and parses the scope's robots.txt. The file feeds
//! seed discovery through its `Sitemap:` directives and, when enabled in the
//! configuration, gates which URLs may enter the frontier.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::fetcher::{fetch_url, FetchResult};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Fetches robots.txt for a scope origin
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - The scope origin, e.g. "https://example.com/"
///
/// # Returns
///
/// * `Some(ParsedRobots)` - robots.txt was served
/// * `None` - The file is missing or the request failed
pub async fn fetch_robots(client: &Client, origin: &Url) -> Option<ParsedRobots> {
    let robots_url = origin.join("/robots.txt").ok()?;

    match fetch_url(client, robots_url.as_str()).await {
        FetchResult::Success { body, .. } => Some(ParsedRobots::from_content(&body)),
        FetchResult::HttpError { status_code } => {
            debug!("No robots.txt at {} (HTTP {})", robots_url, status_code);
            None
        }
        FetchResult::ContentMismatch { content_type } => {
            debug!("Unexpected robots.txt type at {}: {}", robots_url, content_type);
            None
        }
        FetchResult::NetworkError { error } => {
            debug!("Failed to fetch {}: {}", robots_url, error);
            None
        }
    }
}

/// Checks if a URL is allowed by robots.txt
///
/// Only the product token of the user agent (the part before '/') is
/// matched against `User-agent` groups.
pub fn is_allowed(robots: &ParsedRobots, url: &Url, user_agent: &str) -> bool {
    let token = user_agent.split('/').next().unwrap_or(user_agent).trim();
    robots.is_allowed(url.as_str(), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_allowed_uses_product_token() {
        let robots = ParsedRobots::from_content("User-agent: sitewalk\nDisallow: /private\n");
        let url = Url::parse("https://example.com/private/x").unwrap();

        assert!(!is_allowed(
            &robots,
            &url,
            "sitewalk/0.1 (+https://example.com; ops@example.com)"
        ));
        assert!(is_allowed(&robots, &url, "otherbot/1.0"));
    }
}
