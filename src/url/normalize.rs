use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Parses and canonicalizes a URL string
///
/// See [`canonicalize`] for the rules applied after parsing.
///
/// # Examples
///
/// ```
/// use sitewalk::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/docs/#intro", true).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str, strip_query: bool) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url, strip_query)
}

/// Canonicalizes an already-parsed URL into the frontier's dedup key
///
/// # Normalization Steps
///
/// 1. Reject anything that is not HTTP(S) or has no host
/// 2. Lowercase the host
/// 3. Normalize the path:
///    - Remove empty and dot segments
///    - Remove trailing slash (except for root /)
/// 4. Remove the fragment
/// 5. Either drop the query entirely (`strip_query`), or remove tracking
///    parameters and sort the rest so equivalent URLs compare equal
pub fn canonicalize(mut url: Url, strip_query: bool) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if strip_query {
        url.set_query(None);
    } else if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
