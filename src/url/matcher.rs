/// Checks if a host matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches the bare domain and any
///    subdomain at any depth
///
/// # Examples
///
/// ```
/// use sitewalk::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "blog.example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => is_same_or_subdomain(candidate, base),
        None => candidate == pattern,
    }
}

/// Checks whether a host belongs to any entry of a block list
///
/// Block list entries cover their subdomains implicitly, so "facebook.com"
/// also blocks "m.facebook.com". Entries may still use the "*." form.
pub fn host_in_list(host: &str, list: &[String]) -> bool {
    list.iter().any(|entry| {
        let base = entry.strip_prefix("*.").unwrap_or(entry);
        is_same_or_subdomain(host, base)
    })
}

fn is_same_or_subdomain(candidate: &str, base: &str) -> bool {
    candidate == base
        || candidate
            .strip_suffix(base)
            .is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("example.com", "example.com"));
        assert!(!matches_wildcard("example.com", "other.com"));
        assert!(!matches_wildcard("blog.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_nested() {
        assert!(matches_wildcard("*.example.com", "example.com"));
        assert!(matches_wildcard("*.example.com", "www.example.com"));
        assert!(matches_wildcard("*.example.com", "deep.nested.example.com"));
    }

    #[test]
    fn test_wildcard_no_partial_label_match() {
        assert!(!matches_wildcard("*.example.com", "myexample.com"));
        assert!(!matches_wildcard("*.example.com", "example.com.org"));
        assert!(!matches_wildcard("*.example.com", ""));
    }

    #[test]
    fn test_host_in_list_covers_subdomains() {
        let list = vec!["facebook.com".to_string(), "*.youtube.com".to_string()];

        assert!(host_in_list("facebook.com", &list));
        assert!(host_in_list("m.facebook.com", &list));
        assert!(host_in_list("www.youtube.com", &list));
        assert!(!host_in_list("notfacebook.com", &list));
        assert!(!host_in_list("example.com", &list));
    }
}
