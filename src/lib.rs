//! Dispatch Scraper: a call-log recording collector
//!
//! This crate fetches the eDispatches call log through a rotating pool of
//! public HTTP proxies, extracts the audio recordings it lists, and saves
//! them to a local directory. Rate limiting and IP blocking are handled by a
//! retry controller that decides, per failure, whether to throttle or rotate.

pub mod config;
pub mod persist;
pub mod proxy;
pub mod requester;
pub mod response;

use thiserror::Error;

/// Main error type for fatal Dispatch Scraper failures
///
/// Recoverable page-retrieval failures are [`requester::FetchError`] and
/// never escape the cycle driver.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Proxy source unavailable at {url}: {message}")]
    ProxySourceUnavailable { url: String, message: String },

    #[error("Failed to download {url}: {source}")]
    Download { url: String, source: reqwest::Error },

    #[error("Cannot resolve recording URL {relative_url}: {message}")]
    InvalidRecordingUrl {
        relative_url: String,
        message: String,
    },

    #[error("Refusing to save {relative_url} outside the dispatch directory")]
    UnsafePath { relative_url: String },

    #[error("Gave up after {attempts} page retrieval attempts")]
    AttemptsExhausted { attempts: u64 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

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

/// Result type alias for Dispatch Scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use proxy::{ProxyIdentity, ProxyRotator};
pub use requester::{CycleDriver, FailureKind, FetchError, Remediation, RetryController, RunStats};
