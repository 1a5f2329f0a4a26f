//! Response handling for the call-log page
//!
//! This module turns a fetched call-log body into the relative URLs of the
//! audio recordings it lists.

mod call_log;

pub use call_log::{extract_call_relative_urls, CALL_LOG_AUDIO_SELECTOR, CALL_LOG_CONTAINER};
