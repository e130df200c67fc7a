//! HTTP fetcher implementation
//!
//! This module handles the plain HTTP requests of a run:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests for sitemaps and robots.txt during seed discovery
//! - GET requests for pages, with a Content-Type check before the body is read
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Response body
        body: String,
    },

    /// Resource is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns the body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use sitewalk::config::UserAgentConfig;
/// use sitewalk::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "sitewalk".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL regardless of its Content-Type
///
/// Used for sitemaps and robots.txt.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => read_response(response, false).await,
        Err(e) => classify_error(e),
    }
}

/// Fetches a URL that is expected to be an HTML document
///
/// The Content-Type is checked before the body is downloaded, so binary
/// resources that slip past the extension filter are never read.
pub async fn fetch_html(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => read_response(response, true).await,
        Err(e) => classify_error(e),
    }
}

/// Returns true for the Content-Types the crawler treats as HTML
pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

async fn read_response(response: Response, require_html: bool) -> FetchResult {
    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if require_html && !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_error(e),
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };

    FetchResult::NetworkError { error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn client() -> Client {
        build_http_client(&create_test_config(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        assert!(build_http_client(&config, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("Application/XHTML+XML"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type(""));
    }

    #[tokio::test]
    async fn test_fetch_html_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>hi</body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let result = fetch_html(&client(), &format!("{}/page", server.uri())).await;
        match result {
            FetchResult::Success {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 200);
                assert!(body.contains("hi"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_html_rejects_pdf() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0x25, 0x50, 0x44, 0x46], "application/pdf"),
            )
            .mount(&server)
            .await;

        let result = fetch_html(&client(), &format!("{}/file", server.uri())).await;
        assert!(matches!(result, FetchResult::ContentMismatch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_url_accepts_xml() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<urlset></urlset>", "application/xml"),
            )
            .mount(&server)
            .await;

        let body = fetch_url(&client(), &format!("{}/sitemap.xml", server.uri()))
            .await
            .into_body();
        assert_eq!(body.as_deref(), Some("<urlset></urlset>"));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetch_url(&client(), &format!("{}/missing", server.uri())).await;
        assert!(matches!(
            result,
            FetchResult::HttpError { status_code: 404 }
        ));
    }
}
