//! Link filter: turns a raw link into a canonical frontier key or a rejection
//!
//! Filtering is pure. It performs no I/O and never touches the frontier; the
//! coordinator decides what to do with an accepted URL.

use crate::config::CrawlerConfig;
use crate::url::matcher::host_in_list;
use crate::url::normalize::canonicalize;
use crate::url::Scope;
use crate::UrlResult;
use std::fmt;
use url::Url;

/// Why a link was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty href or a same-page fragment
    Empty,
    /// Could not be resolved into a URL
    Unparsable,
    /// mailto:, tel:, javascript:, data: and any other non-HTTP scheme
    UnsupportedScheme(String),
    /// Host is on the third-party/social block list
    ExcludedHost,
    /// Different origin than the crawl scope
    OutOfScope,
    /// Path does not start with any allowed prefix
    NotIncludedPath,
    /// Path starts with an excluded prefix
    ExcludedPath,
    /// Path ends with an excluded extension
    ExcludedExtension,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty or fragment-only link"),
            Self::Unparsable => write!(f, "unparsable link"),
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported scheme '{}'", scheme),
            Self::ExcludedHost => write!(f, "excluded host"),
            Self::OutOfScope => write!(f, "outside crawl scope"),
            Self::NotIncludedPath => write!(f, "path outside included prefixes"),
            Self::ExcludedPath => write!(f, "excluded path prefix"),
            Self::ExcludedExtension => write!(f, "excluded extension"),
        }
    }
}

/// Pre-compiled filter rules derived from the crawler configuration
#[derive(Debug, Clone)]
pub struct LinkFilter {
    scope: Scope,
    included_path_prefixes: Vec<String>,
    excluded_path_prefixes: Vec<String>,
    excluded_extensions: Vec<String>,
    excluded_hosts: Vec<String>,
    strip_query: bool,
}

impl LinkFilter {
    /// Builds the filter from a crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> UrlResult<Self> {
        Ok(Self {
            scope: Scope::parse(&config.domain_scope, config.include_subdomains)?,
            included_path_prefixes: config.included_path_prefixes.clone(),
            excluded_path_prefixes: config.excluded_path_prefixes.clone(),
            excluded_extensions: config
                .excluded_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            excluded_hosts: config
                .excluded_hosts
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            strip_query: config.strip_query,
        })
    }

    /// The scope this filter confines links to
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether canonical keys drop the query string
    pub fn strip_query(&self) -> bool {
        self.strip_query
    }

    /// Applies the scope, host, path and extension rules to an absolute URL
    pub fn check(&self, url: Url) -> Result<Url, Rejection> {
        let url = canonicalize(url, self.strip_query).map_err(|_| Rejection::Unparsable)?;

        let host = url.host_str().unwrap_or_default();
        if host_in_list(host, &self.excluded_hosts) {
            return Err(Rejection::ExcludedHost);
        }

        if !self.scope.contains(&url) {
            return Err(Rejection::OutOfScope);
        }

        let path = url.path();
        if !self.included_path_prefixes.is_empty()
            && !self
                .included_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(Rejection::NotIncludedPath);
        }

        if self
            .excluded_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return Err(Rejection::ExcludedPath);
        }

        let lower = path.to_lowercase();
        if self
            .excluded_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
        {
            return Err(Rejection::ExcludedExtension);
        }

        Ok(url)
    }
}

/// Resolves a raw link against its page and decides whether it may be crawled
///
/// Returns the canonical URL (the frontier key) on acceptance.
///
/// # Examples
///
/// ```
/// use sitewalk::config::CrawlerConfig;
/// use sitewalk::url::{accept, LinkFilter, Rejection};
/// use url::Url;
///
/// let mut config = CrawlerConfig::new("https://example.test", vec![]);
/// config.excluded_path_prefixes = vec!["/private".to_string()];
/// let filter = LinkFilter::from_config(&config).unwrap();
/// let base = Url::parse("https://example.test/a").unwrap();
///
/// assert_eq!(accept("/b#top", &base, &filter).unwrap().as_str(), "https://example.test/b");
/// assert_eq!(accept("/private/x", &base, &filter), Err(Rejection::ExcludedPath));
/// ```
pub fn accept(raw_link: &str, base_url: &Url, filter: &LinkFilter) -> Result<Url, Rejection> {
    let raw = raw_link.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return Err(Rejection::Empty);
    }

    let resolved = base_url.join(raw).map_err(|_| Rejection::Unparsable)?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(Rejection::UnsupportedScheme(resolved.scheme().to_string()));
    }

    filter.check(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> LinkFilter {
        let mut config = CrawlerConfig::new(
            "https://example.test",
            vec!["https://example.test/".to_string()],
        );
        config.excluded_path_prefixes = vec!["/private".to_string()];
        LinkFilter::from_config(&config).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://example.test/section/page").unwrap()
    }

    #[test]
    fn test_accept_relative_link() {
        let url = accept("other", &base(), &filter()).unwrap();
        assert_eq!(url.as_str(), "https://example.test/section/other");

        let url = accept("/b", &base(), &filter()).unwrap();
        assert_eq!(url.as_str(), "https://example.test/b");
    }

    #[test]
    fn test_fragment_and_query_stripped() {
        let url = accept("/b/?q=1#frag", &base(), &filter()).unwrap();
        assert_eq!(url.as_str(), "https://example.test/b");
    }

    #[test]
    fn test_special_schemes_rejected() {
        for link in [
            "mailto:info@example.test",
            "tel:+441234",
            "javascript:void(0)",
            "data:text/html,hi",
        ] {
            assert!(
                matches!(
                    accept(link, &base(), &filter()),
                    Err(Rejection::UnsupportedScheme(_))
                ),
                "{} should be rejected",
                link
            );
        }
    }

    #[test]
    fn test_empty_and_fragment_only_rejected() {
        assert_eq!(accept("  ", &base(), &filter()), Err(Rejection::Empty));
        assert_eq!(accept("#top", &base(), &filter()), Err(Rejection::Empty));
    }

    #[test]
    fn test_unparsable_rejected() {
        assert_eq!(
            accept("https://exa mple.test/", &base(), &filter()),
            Err(Rejection::Unparsable)
        );
    }

    #[test]
    fn test_out_of_scope_rejected() {
        assert_eq!(
            accept("https://other.test/a", &base(), &filter()),
            Err(Rejection::OutOfScope)
        );
        assert_eq!(
            accept("http://example.test/a", &base(), &filter()),
            Err(Rejection::OutOfScope)
        );
    }

    #[test]
    fn test_social_hosts_rejected() {
        assert_eq!(
            accept("https://www.facebook.com/share", &base(), &filter()),
            Err(Rejection::ExcludedHost)
        );
    }

    #[test]
    fn test_excluded_prefix_rejected() {
        assert_eq!(
            accept("/private/x", &base(), &filter()),
            Err(Rejection::ExcludedPath)
        );
        assert_eq!(
            accept("/private", &base(), &filter()),
            Err(Rejection::ExcludedPath)
        );
    }

    #[test]
    fn test_excluded_extension_rejected_case_insensitively() {
        for link in ["/img/logo.PNG", "/files/report.pdf", "/static/app.js"] {
            assert_eq!(
                accept(link, &base(), &filter()),
                Err(Rejection::ExcludedExtension),
                "{} should be rejected",
                link
            );
        }
        assert!(accept("/page.html", &base(), &filter()).is_ok());
    }

    #[test]
    fn test_included_prefixes_restrict_section() {
        let mut config = CrawlerConfig::new("https://example.test", vec![]);
        config.included_path_prefixes = vec!["/things-to-do".to_string()];
        let filter = LinkFilter::from_config(&config).unwrap();

        assert!(accept("/things-to-do/museums", &base(), &filter).is_ok());
        assert_eq!(
            accept("/shop", &base(), &filter),
            Err(Rejection::NotIncludedPath)
        );
    }

    #[test]
    fn test_query_kept_when_configured() {
        let mut config = CrawlerConfig::new("https://example.test", vec![]);
        config.strip_query = false;
        let filter = LinkFilter::from_config(&config).unwrap();

        let url = accept("/list?page=2&utm_source=x", &base(), &filter).unwrap();
        assert_eq!(url.as_str(), "https://example.test/list?page=2");
    }
}
