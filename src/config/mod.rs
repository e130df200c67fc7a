//! Configuration module for sitewalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitewalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitewalk.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, OutputFormat, UserAgentConfig,
    DEFAULT_EXCLUDED_EXTENSIONS, DEFAULT_EXCLUDED_HOSTS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
