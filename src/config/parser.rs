use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is logged at the start of every run so results can be tied back
/// to the exact configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[crawler]
seed-urls = ["https://example.com/"]
domain-scope = "https://example.com"
excluded-path-prefixes = ["/private"]
max-depth = 3
max-concurrency = 8
min-concurrency = 2
per-request-timeout = 5000

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
results-path = "./results.jsonl"
links-path = "./all_links.txt"
format = "jsonl"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_concurrency, Some(8));
        assert_eq!(config.crawler.concurrency_bounds(), (2, 8));
        assert_eq!(config.crawler.excluded_path_prefixes, vec!["/private"]);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.output.links_path.as_deref(), Some("./all_links.txt"));
    }

    #[test]
    fn test_defaults_applied() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert!(config.crawler.strip_query);
        assert!(config.crawler.use_sitemap);
        assert!(!config.crawler.respect_robots_txt);
        assert!(config
            .crawler
            .excluded_extensions
            .contains(&".pdf".to_string()));
        assert!(config
            .crawler
            .excluded_hosts
            .contains(&"facebook.com".to_string()));
        assert_eq!(config.crawler.navigation_timeout, 30_000);
        assert_eq!(config.crawler.page_limit(), None);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_CONFIG.replace("min-concurrency = 2", "min-concurrency = 20");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
