//! Configuration module for Dispatch Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are layered on top of the loaded values in `main`.
//!
//! # Example
//!
//! ```no_run
//! use dispatch_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dispatch.toml")).unwrap();
//! println!("Failure threshold: {}", config.requester.failure_threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CompletionPolicy, Config, OutputConfig, ProxyConfig, RequesterConfig, TargetConfig,
    UserAgentConfig, DEFAULT_AVERAGE_WAIT_SECS, DEFAULT_CALL_LOG_URL,
    DEFAULT_CONSECUTIVE_FAILURES_THRESHOLD, DEFAULT_DISPATCH_DIRECTORY, DEFAULT_PROXY_LIST_URL,
    DEFAULT_PROXY_ROW_SELECTOR, DEFAULT_RELATIVE_URL_PREFIX, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STARTING_PROXY, MAX_AVERAGE_WAIT_SECS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
