use crate::config::Config;
use crate::persist::Persister;
use crate::{ConfigError, ScraperError};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Timeout for a single recording download
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// What saving a single recording did on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The file did not exist and was written
    New,

    /// The file existed and was replaced
    Overwritten,

    /// The file existed and was left alone
    Skipped,
}

/// A recording written during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub relative_url: String,
    pub saved_at: DateTime<Utc>,

    /// True if an earlier copy was replaced
    pub replaced: bool,
}

/// Saves remote files under a local directory, keyed by relative URL
///
/// `/audio/2020/05/call.mp3` with directory `./dispatches` lands at
/// `./dispatches/audio/2020/05/call.mp3`. Relative URLs are resolved under
/// the prefix with or without a leading slash; absolute URLs are fetched
/// as-is and saved by their path. Downloads go directly to the origin, not
/// through the proxy.
pub struct InternetFilePersister {
    client: Client,
    containing_directory: PathBuf,
    base_url: Url,
    overwrite_existing: bool,
    saved: Vec<SavedFile>,
}

impl InternetFilePersister {
    pub fn new(
        containing_directory: impl Into<PathBuf>,
        relative_url_prefix: impl Into<String>,
        overwrite_existing: bool,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let prefix = relative_url_prefix.into();

        // A trailing slash keeps any path in the prefix when joining
        let base_url = Url::parse(&format!("{}/", prefix.trim_end_matches('/')))
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", prefix, e)))?;

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            containing_directory: containing_directory.into(),
            base_url,
            overwrite_existing,
            saved: Vec::new(),
        })
    }

    /// Creates a persister from the `[output]` and `[target]` sections
    pub fn from_config(config: &Config) -> Result<Self, ScraperError> {
        Self::new(
            &config.output.dispatch_directory,
            config.target.relative_url_prefix.as_str(),
            config.output.overwrite_existing,
            &config.user_agent.header_value(),
        )
    }

    /// Files written so far, in order
    pub fn saved_files(&self) -> &[SavedFile] {
        &self.saved
    }

    /// Resolves a relative URL against the prefix
    ///
    /// `calls/a.mp3` and `/calls/a.mp3` resolve to the same URL. An absolute
    /// URL is returned unchanged.
    pub fn download_url(&self, relative_url: &str) -> Result<Url, ScraperError> {
        if let Ok(absolute) = Url::parse(relative_url) {
            return Ok(absolute);
        }

        let joined = if relative_url.starts_with("//") {
            self.base_url.join(relative_url)
        } else {
            self.base_url.join(relative_url.trim_start_matches('/'))
        };

        joined.map_err(|e| ScraperError::InvalidRecordingUrl {
            relative_url: relative_url.to_string(),
            message: e.to_string(),
        })
    }

    /// Maps a relative URL onto a path inside the containing directory
    ///
    /// Query strings and fragments are dropped, as is the origin of an
    /// absolute URL. `..` segments are rejected.
    pub fn target_path(&self, relative_url: &str) -> Result<PathBuf, ScraperError> {
        let absolute = Url::parse(relative_url).ok();
        let path_part = match &absolute {
            Some(url) => url.path(),
            None => relative_url.split(['?', '#']).next().unwrap_or_default(),
        };

        let mut target = self.containing_directory.clone();
        let mut pushed = false;

        for component in Path::new(path_part.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => {
                    target.push(segment);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => {
                    return Err(ScraperError::UnsafePath {
                        relative_url: relative_url.to_string(),
                    })
                }
            }
        }

        if !pushed {
            return Err(ScraperError::UnsafePath {
                relative_url: relative_url.to_string(),
            });
        }

        Ok(target)
    }

    /// Saves one recording
    pub async fn save_file_from_relative_url(
        &mut self,
        relative_url: &str,
    ) -> Result<SaveOutcome, ScraperError> {
        let file_path = self.target_path(relative_url)?;

        let exists = tokio::fs::try_exists(&file_path).await?;
        if exists && !self.overwrite_existing {
            tracing::debug!("Skipping {}; already saved", relative_url);
            return Ok(SaveOutcome::Skipped);
        }

        tracing::info!("Saving call at {}", relative_url);
        let url = self.download_url(relative_url)?.to_string();
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ScraperError::Download {
                url: url.clone(),
                source,
            })?
            .bytes()
            .await
            .map_err(|source| ScraperError::Download {
                url: url.clone(),
                source,
            })?;

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target and rename so a partial download never
        // shows up as an existing file
        let mut partial = file_path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &file_path).await?;

        self.saved.push(SavedFile {
            path: file_path,
            relative_url: relative_url.to_string(),
            saved_at: Utc::now(),
            replaced: exists,
        });

        if exists {
            Ok(SaveOutcome::Overwritten)
        } else {
            Ok(SaveOutcome::New)
        }
    }
}

impl Persister for InternetFilePersister {
    async fn save_all(&mut self, relative_urls: &[String]) -> Result<usize, ScraperError> {
        tracing::info!("Saving {} calls", relative_urls.len());

        let mut written = 0;
        // Only files absent before this call count as new
        for relative_url in relative_urls {
            if self.save_file_from_relative_url(relative_url).await? == SaveOutcome::New {
                written += 1;
            }
        }

        Ok(written)
    }
}
