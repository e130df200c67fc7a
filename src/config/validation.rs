use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::url::Scope;
use crate::ConfigError;
use url::Url;

/// Largest worker pool the crawler will agree to run
const MAX_WORKERS: u32 = 256;

/// Smallest accepted timeout in milliseconds
const MIN_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let scope = Scope::parse(&config.domain_scope, config.include_subdomains).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid domain_scope '{}': {}",
            config.domain_scope, e
        ))
    })?;

    if config.seed_urls.is_empty() {
        return Err(ConfigError::Validation(
            "seed_urls must contain at least one URL".to_string(),
        ));
    }

    for seed in &config.seed_urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if !scope.contains(&url) {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' is outside domain_scope '{}'",
                seed, config.domain_scope
            )));
        }
    }

    if let Some(max) = config.max_concurrency {
        if max < 1 || max > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "max_concurrency must be between 1 and {}, got {}",
                MAX_WORKERS, max
            )));
        }
    }

    if let Some(min) = config.min_concurrency {
        if min < 1 {
            return Err(ConfigError::Validation(format!(
                "min_concurrency must be >= 1, got {}",
                min
            )));
        }
        if let Some(max) = config.max_concurrency {
            if min > max {
                return Err(ConfigError::Validation(format!(
                    "min_concurrency ({}) cannot exceed max_concurrency ({})",
                    min, max
                )));
            }
        }
    }

    for (name, value) in [
        ("per_request_timeout", config.per_request_timeout),
        ("navigation_timeout", config.navigation_timeout),
    ] {
        if value < MIN_TIMEOUT_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be >= {}ms, got {}ms",
                name, MIN_TIMEOUT_MS, value
            )));
        }
    }

    for prefix in config
        .excluded_path_prefixes
        .iter()
        .chain(config.included_path_prefixes.iter())
    {
        if !prefix.starts_with('/') {
            return Err(ConfigError::InvalidPattern(format!(
                "Path prefix '{}' must start with '/'",
                prefix
            )));
        }
    }

    for ext in &config.excluded_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "Excluded extension '{}' must look like '.ext'",
                ext
            )));
        }
    }

    for host in &config.excluded_hosts {
        validate_domain_pattern(host)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.links_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "links_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a host pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") || !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be a dotted host name",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid email format: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig::new(
                "https://example.com",
                vec!["https://example.com/".to_string()],
            ),
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                results_path: "results.json".to_string(),
                links_path: None,
                format: OutputFormat::Json,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_seed_outside_scope_rejected() {
        let mut config = valid_config();
        config.crawler.seed_urls = vec!["https://other.com/".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_seed_list_rejected() {
        let mut config = valid_config();
        config.crawler.seed_urls.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_scope_rejected() {
        let mut config = valid_config();
        config.crawler.domain_scope = "ftp://example.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_concurrency_bounds_checked() {
        let mut config = valid_config();
        config.crawler.max_concurrency = Some(0);
        assert!(validate(&config).is_err());

        config.crawler.max_concurrency = Some(4);
        config.crawler.min_concurrency = Some(5);
        assert!(validate(&config).is_err());

        config.crawler.min_concurrency = Some(4);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_timeout_floor() {
        let mut config = valid_config();
        config.crawler.per_request_timeout = 10;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_path_prefix_must_be_absolute() {
        let mut config = valid_config();
        config.crawler.excluded_path_prefixes = vec!["private".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_extension_needs_dot() {
        let mut config = valid_config();
        config.crawler.excluded_extensions = vec!["pdf".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("sub.example.com").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
