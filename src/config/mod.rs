//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to the defaults
//! in [`types`].
//!
//! # Example
//!
//! ```toml
//! [crawler]
//! pool-multiplier = 2
//! max-items = 30
//! download-concurrency = 4
//! request-delay-ms = 100
//! request-timeout-secs = 30
//! exclude-tags = ["R-18", "AI"]
//!
//! [auth]
//! token-path = "token.txt"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! download-root = "static/downloads"
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, AuthConfig, Config, CrawlerConfig, DownloadConfig, ServerConfig,
    DEFAULT_EXCLUDE_TAGS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;
