//! Persistence of call recordings
//!
//! Downloads each extracted recording into a local directory that mirrors
//! the recording's URL path. Existing files are skipped unless overwriting
//! is enabled.

mod internet_file;

pub use internet_file::{InternetFilePersister, SaveOutcome, SavedFile};

use crate::ScraperError;

/// A sink for the relative URLs found on the call log
#[allow(async_fn_in_trait)]
pub trait Persister {
    /// Saves every referenced resource and returns how many files did not exist before
    ///
    /// Replacing an existing file does not count.
    ///
    /// Errors are fatal to the run; they are not handled by the retry policy.
    async fn save_all(&mut self, relative_urls: &[String]) -> Result<usize, ScraperError>;
}
