//! Page rendering capability
//!
//! The crawler never drives a browser directly. It talks to a [`Renderer`]
//! that hands out isolated [`RenderedPage`] contexts, one per page visit.
//! A context can navigate, wait for the DOM to settle, hide page regions
//! and serialize what remains. Backends decide how much of that is real:
//! [`HttpRenderer`] fetches static HTML and treats it as settled on arrival.

mod http;

pub use http::HttpRenderer;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Outcome of waiting for a page to stop changing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// The DOM settled within the timeout
    Stable,
    /// The timeout elapsed first; the current DOM is used as is
    TimedOut,
}

impl Stability {
    /// True when the wait ran out before the page settled
    pub fn timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// A navigation that did not produce a usable document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Connection, TLS or protocol failure
    #[error("network error: {0}")]
    Network(String),

    /// The page did not load within the navigation timeout
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// The response was not an HTML document
    #[error("not an HTML document ({0})")]
    NotHtml(String),

    /// A redirect left the crawlable part of the site
    #[error("redirected out of scope to {0}")]
    OutOfScope(String),

    /// The backend could not provide a page context
    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

/// A source of isolated page contexts
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh page context
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>, NavigationError>;
}

/// A single page context, used for exactly one visit
///
/// Dropping the context releases it; `close` lets a backend release it
/// asynchronously on the normal path.
#[async_trait]
pub trait RenderedPage: Send {
    /// Loads the URL and returns the final URL after redirects
    async fn navigate(&mut self, url: &Url) -> Result<Url, NavigationError>;

    /// Waits until the DOM stops changing or the timeout elapses
    async fn await_stable(&mut self, timeout: Duration) -> Stability;

    /// Hides every element matching any of the CSS selectors
    async fn suppress(&mut self, selectors: &[&str]);

    /// Serializes the current DOM, without suppressed elements
    async fn content(&mut self) -> Result<String, NavigationError>;

    /// Releases the context
    async fn close(&mut self) {}
}
