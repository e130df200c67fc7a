use serde::Deserialize;
use std::time::Duration;

/// Extensions that never point at crawlable pages
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".pdf", ".doc", ".docx", ".xls",
    ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz", ".mp4", ".avi", ".mov", ".wmv",
    ".mp3", ".wav", ".ogg", ".css", ".js", ".json", ".xml", ".woff", ".woff2", ".ttf", ".eot",
];

/// Third-party and social hosts that are never followed
pub const DEFAULT_EXCLUDED_HOSTS: &[&str] = &[
    "facebook.com",
    "youtube.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "pinterest.com",
    "tiktok.com",
    "whatsapp.com",
];

/// Main configuration structure for sitewalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URLs the crawl always starts from (depth 0)
    pub seed_urls: Vec<String>,

    /// Origin of the crawl, e.g. "https://example.com"
    pub domain_scope: String,

    /// Treat every subdomain of the scope host as in scope
    #[serde(default)]
    pub include_subdomains: bool,

    /// When non-empty, only paths starting with one of these are followed
    #[serde(default)]
    pub included_path_prefixes: Vec<String>,

    /// Paths starting with any of these are never followed
    #[serde(default)]
    pub excluded_path_prefixes: Vec<String>,

    /// Path extensions that are never followed (lowercase, with leading dot)
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Hosts (and their subdomains) that are never followed
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Drop the query string when building the canonical key
    #[serde(default = "default_true")]
    pub strip_query: bool,

    /// Maximum number of discovery hops from a seed
    pub max_depth: u32,

    /// Upper bound on simultaneously rendered pages (CPU-derived when absent)
    #[serde(default)]
    pub max_concurrency: Option<u32>,

    /// Lower bound on simultaneously rendered pages (CPU-derived when absent)
    #[serde(default)]
    pub min_concurrency: Option<u32>,

    /// Upper bound for the content-stability wait (milliseconds)
    #[serde(default = "default_per_request_timeout")]
    pub per_request_timeout: u64,

    /// Upper bound for navigation itself (milliseconds)
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Stop dispatching after this many pages (0 = unlimited)
    #[serde(default)]
    pub max_pages: u64,

    /// Run sitemap/robots.txt seed discovery before crawling
    #[serde(default = "default_true")]
    pub use_sitemap: bool,

    /// Skip URLs disallowed by the scope's robots.txt
    #[serde(default)]
    pub respect_robots_txt: bool,

    /// Paragraphs shorter than this (in characters) are dropped
    #[serde(default = "default_min_paragraph_length")]
    pub min_paragraph_length: usize,
}

impl CrawlerConfig {
    /// Builds a config with defaults for everything but the seeds and scope
    pub fn new(domain_scope: &str, seed_urls: Vec<String>) -> Self {
        Self {
            seed_urls,
            domain_scope: domain_scope.to_string(),
            include_subdomains: false,
            included_path_prefixes: Vec::new(),
            excluded_path_prefixes: Vec::new(),
            excluded_extensions: default_excluded_extensions(),
            excluded_hosts: default_excluded_hosts(),
            strip_query: true,
            max_depth: 5,
            max_concurrency: None,
            min_concurrency: None,
            per_request_timeout: default_per_request_timeout(),
            navigation_timeout: default_navigation_timeout(),
            max_pages: 0,
            use_sitemap: true,
            respect_robots_txt: false,
            min_paragraph_length: default_min_paragraph_length(),
        }
    }

    /// Stability wait bound as a Duration
    pub fn per_request_timeout(&self) -> Duration {
        Duration::from_millis(self.per_request_timeout)
    }

    /// Navigation bound as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    /// Global page limit, if any
    pub fn page_limit(&self) -> Option<u64> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    /// Resolves the (min, max) worker bounds
    ///
    /// Missing bounds are derived from the number of available cores:
    /// three workers per core for the maximum and half the cores for the
    /// minimum. The result always satisfies `1 <= min <= max`.
    pub fn concurrency_bounds(&self) -> (usize, usize) {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        resolve_bounds(self.min_concurrency, self.max_concurrency, cores)
    }
}

/// Resolves optional worker bounds against a core count
pub(crate) fn resolve_bounds(min: Option<u32>, max: Option<u32>, cores: usize) -> (usize, usize) {
    let max = max
        .map(|m| m as usize)
        .unwrap_or_else(|| cores.saturating_mul(3))
        .max(1);
    let min = min
        .map(|m| m as usize)
        .unwrap_or_else(|| (cores / 2).max(1))
        .clamp(1, max);
    (min, max)
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// On-disk output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single JSON document with `records` and `failures`
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
    /// A SQLite database with `records` and `failures` tables
    Sqlite,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the results file (or database)
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Path of the sorted discovered-links list
    #[serde(rename = "links-path", default)]
    pub links_path: Option<String>,

    /// Serialization format of the results
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_true() -> bool {
    true
}

fn default_per_request_timeout() -> u64 {
    15_000
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_min_paragraph_length() -> usize {
    30
}

fn default_excluded_extensions() -> Vec<String> {
    DEFAULT_EXCLUDED_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_hosts() -> Vec<String> {
    DEFAULT_EXCLUDED_HOSTS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_bounds() {
        assert_eq!(resolve_bounds(Some(2), Some(8), 4), (2, 8));
    }

    #[test]
    fn test_resolve_bounds_from_cores() {
        assert_eq!(resolve_bounds(None, None, 8), (4, 24));
        assert_eq!(resolve_bounds(None, None, 1), (1, 3));
    }

    #[test]
    fn test_min_clamped_to_max() {
        assert_eq!(resolve_bounds(Some(10), Some(4), 8), (4, 4));
        assert_eq!(resolve_bounds(Some(0), Some(0), 8), (1, 1));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("ndjson".parse::<OutputFormat>(), Ok(OutputFormat::Jsonl));
        assert_eq!("sqlite".parse::<OutputFormat>(), Ok(OutputFormat::Sqlite));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_user_agent_header() {
        let ua = UserAgentConfig {
            crawler_name: "sitewalk".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "ops@example.com".to_string(),
        };
        assert_eq!(
            ua.header_value(),
            "sitewalk/0.1 (+https://example.com/about; ops@example.com)"
        );
    }
}
