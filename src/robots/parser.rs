//! Robots.txt parser implementation
//!
//! Allow/disallow checks are delegated to the robotstxt crate. The `Sitemap:`
//! directives used for seed discovery are read directly from the raw content.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// Keeps the raw file; the robotstxt matcher re-reads it on every check.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent product token
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the `Sitemap:` directive values, in file order
    ///
    /// The directive is group-independent, so every occurrence counts no
    /// matter which `User-agent` block it appears in.
    pub fn sitemaps(&self) -> Vec<String> {
        let mut sitemaps = Vec::new();

        for line in self.content.lines() {
            let trimmed = line.split('#').next().unwrap_or_default().trim();

            if let Some((key, value)) = trimmed.split_once(':') {
                let value = value.trim();
                if key.trim().eq_ignore_ascii_case("sitemap")
                    && !value.is_empty()
                    && !sitemaps.iter().any(|s| s == value)
                {
                    sitemaps.push(value.to_string());
                }
            }
        }

        sitemaps
    }
}
