//! pixiv-crawler: tag-driven illustration harvester
//!
//! This crate searches pixiv by tag, pools the results across paginated responses,
//! filters out excluded tags, ranks the pool by bookmark count and downloads the
//! top illustrations as PNG files. It can run once from the command line or as a
//! small HTTP service that crawls in the background.

pub mod auth;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod search;
pub mod server;
pub mod status;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),

    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Credential acquisition errors. Always fatal to a crawl.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to access token cache {path}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No cached token and no login endpoint configured")]
    NoLoginFlow,

    #[error("Login requires a username and password")]
    MissingCredentials,

    #[error("Login flow failed: {0}")]
    LoginFailed(String),

    #[error("Login flow returned an empty token")]
    EmptyToken,

    #[error("Token exchange rejected with HTTP {status}")]
    TokenRejected { status: u16 },

    #[error("HTTP error during authentication: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from a single search page request
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed search response: {0}")]
    Decode(String),

    #[error("Invalid search URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlReport};
pub use model::{CrawlRequest, DownloadOutcome, Illustration, SearchCursor, SkipReason};
pub use status::{StatusEntry, StatusLog};
