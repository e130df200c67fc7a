//! URL handling module for sitewalk
//!
//! This module provides URL canonicalization, wildcard host matching, the
//! crawl scope, and the link filter that decides which discovered links may
//! enter the frontier.

mod filter;
mod matcher;
mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

pub use filter::{accept, LinkFilter, Rejection};
pub use matcher::{host_in_list, matches_wildcard};
pub use normalize::{canonicalize, normalize_url};

/// The origin a crawl is confined to
///
/// A URL is in scope when it shares the scope's scheme and effective port,
/// and its host equals the scope host (or, with `include_subdomains`, is any
/// subdomain of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    origin: Url,
    host: String,
    include_subdomains: bool,
}

impl Scope {
    /// Parses a scope from an origin string such as "https://example.com"
    ///
    /// Any path, query or fragment on the input is ignored.
    pub fn parse(scope: &str, include_subdomains: bool) -> UrlResult<Self> {
        let mut origin = Url::parse(scope.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(UrlError::InvalidScheme(origin.scheme().to_string()));
        }

        let host = origin
            .host_str()
            .ok_or(UrlError::MissingDomain)?
            .to_lowercase();

        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Ok(Self {
            origin,
            host,
            include_subdomains,
        })
    }

    /// The scope origin with a root path, e.g. "https://example.com/"
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// The lowercase scope host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if the URL belongs to this scope
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != self.origin.scheme()
            || url.port_or_known_default() != self.origin.port_or_known_default()
        {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        if self.include_subdomains {
            matches_wildcard(&format!("*.{}", self.host), &host)
        } else {
            host == self.host
        }
    }
}
