//! Page-retrieval failures and their classification
//!
//! [`FetchError`] is the condition raised by the fetch and extract steps.
//! [`classify`] maps it to a [`FailureKind`] with no I/O, so the retry policy
//! can be exercised against synthetic failures.

use std::fmt;
use thiserror::Error;

/// HTTP status that marks the current proxy as rate limited
pub const RATE_LIMITED_STATUS: u16 = 429;

/// A recoverable page-retrieval failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} returned by {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Too many redirects from {url} (probably a bad proxy)")]
    TooManyRedirects { url: String },

    #[error("Error while requesting {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Maps a reqwest error raised while sending or reading a request
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();

        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_redirect() {
            Self::TooManyRedirects { url }
        } else if let Some(status) = error.status().filter(|s| s.as_u16() >= 400) {
            Self::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// Classification of a page-retrieval failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// HTTP 429
    RateLimited,

    /// Any other status >= 400
    HttpStatus(u16),

    /// Connection reset, DNS failure, malformed body
    Transport,

    /// Expected document structure was absent
    Parse,

    Timeout,

    TooManyRedirects,
}

impl FailureKind {
    /// Returns true for failures that burn the current proxy immediately
    pub fn forces_rotation(&self) -> bool {
        matches!(self, Self::RateLimited | Self::TooManyRedirects)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited (HTTP 429)"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Transport => write!(f, "transport error"),
            Self::Parse => write!(f, "parse error"),
            Self::Timeout => write!(f, "timeout"),
            Self::TooManyRedirects => write!(f, "too many redirects"),
        }
    }
}

/// Classifies a raised failure
pub fn classify(error: &FetchError) -> FailureKind {
    match error {
        FetchError::HttpStatus { status, .. } if *status == RATE_LIMITED_STATUS => {
            FailureKind::RateLimited
        }
        FetchError::HttpStatus { status, .. } => FailureKind::HttpStatus(*status),
        FetchError::Timeout { .. } => FailureKind::Timeout,
        FetchError::TooManyRedirects { .. } => FailureKind::TooManyRedirects,
        FetchError::Transport { .. } => FailureKind::Transport,
        FetchError::Parse { .. } => FailureKind::Parse,
    }
}
