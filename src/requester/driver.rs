//! Cycle driver - main fetch/extract/persist loop
//!
//! Each cycle fetches the call log through the current proxy, extracts the
//! recording URLs and hands them to the persister. Recoverable failures are
//! classified and passed to the [`RetryController`], whose remediation the
//! driver carries out before retrying. The loop ends when the completion
//! policy reports no remaining work.

use crate::config::{CompletionPolicy, RequesterConfig};
use crate::persist::Persister;
use crate::proxy::{ProxyIdentity, ProxyRotator, ProxySource};
use crate::requester::{
    classify, FetchError, PageFetcher, Remediation, RequestSpec, RetryController,
};
use crate::response::extract_call_relative_urls;
use crate::ScraperError;
use rand::Rng;
use std::time::Duration;

/// Result of one successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Recordings listed on the page
    pub relative_urls_found: usize,

    /// Recordings that did not exist on disk before this cycle
    pub files_saved: usize,
}

impl CompletionPolicy {
    /// Returns true if another cycle should run after `outcome`
    pub fn more_work_remains(&self, outcome: &CycleOutcome) -> bool {
        match self {
            Self::SingleCycle => false,
            Self::UntilNoNewFiles => outcome.files_saved > 0,
        }
    }
}

/// Counters over a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub attempts: u64,
    pub successful_cycles: u64,
    pub failures: u64,

    /// Rotations made by the retry policy (not counting initialization)
    pub rotations: u64,

    /// Throttle sleeps, after failures and between successful cycles
    pub throttles: u64,
    pub files_saved: u64,
}

/// Loop settings taken from `[requester]`
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub request_timeout: Duration,
    pub completion: CompletionPolicy,
    pub max_attempts: Option<u64>,
}

impl From<&RequesterConfig> for DriverSettings {
    fn from(config: &RequesterConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            completion: config.completion,
            max_attempts: config.max_attempts,
        }
    }
}

/// Orchestrates fetch, extraction and persistence until completion
pub struct CycleDriver<S, F, P, R> {
    request: RequestSpec,
    rotator: ProxyRotator<S, R>,
    controller: RetryController<R>,
    fetcher: F,
    persister: P,
    settings: DriverSettings,
    stats: RunStats,
}

impl<S, F, P, R> CycleDriver<S, F, P, R>
where
    S: ProxySource,
    F: PageFetcher,
    P: Persister,
    R: Rng,
{
    pub fn new(
        request: RequestSpec,
        rotator: ProxyRotator<S, R>,
        controller: RetryController<R>,
        fetcher: F,
        persister: P,
        settings: DriverSettings,
    ) -> Self {
        Self {
            request,
            rotator,
            controller,
            fetcher,
            persister,
            settings,
            stats: RunStats::default(),
        }
    }

    /// Runs cycles until the completion policy is satisfied
    ///
    /// # Errors
    ///
    /// Fatal conditions only: the proxy source being unavailable during a
    /// rotation, persistence failures, or the attempt ceiling being reached.
    pub async fn run(&mut self) -> Result<RunStats, ScraperError> {
        tracing::info!(
            "Starting run against {} with proxy {}",
            self.request.url,
            self.rotator.current()
        );

        loop {
            self.check_attempts_remaining()?;

            self.stats.attempts += 1;
            self.controller.begin_attempt();

            match self.attempt().await {
                Ok(relative_urls) => {
                    self.controller.record_success();

                    let files_saved = self.persister.save_all(&relative_urls).await?;
                    let outcome = CycleOutcome {
                        relative_urls_found: relative_urls.len(),
                        files_saved,
                    };
                    self.stats.successful_cycles += 1;
                    self.stats.files_saved += files_saved as u64;

                    tracing::info!(
                        "Found {} calls, saved {} new",
                        outcome.relative_urls_found,
                        outcome.files_saved
                    );

                    if !self.settings.completion.more_work_remains(&outcome) {
                        tracing::info!("Job done (for now)");
                        return Ok(self.stats.clone());
                    }

                    let wait = self.controller.throttle_duration();
                    self.throttle(wait).await;
                }
                Err(error) => {
                    tracing::error!("{}", error);
                    self.stats.failures += 1;

                    let remediation = self.controller.on_failure(classify(&error));

                    // The ceiling is checked before any remediation runs
                    self.check_attempts_remaining()?;

                    match remediation {
                        Remediation::Rotate { .. } => {
                            self.rotator.rotate().await?;
                            self.stats.rotations += 1;
                        }
                        Remediation::Throttle(wait) => self.throttle(wait).await,
                    }
                }
            }
        }
    }

    /// Fetches and extracts one page through the current proxy
    async fn attempt(&mut self) -> Result<Vec<String>, FetchError> {
        let via = self.rotator.current().clone();
        let response = self
            .fetcher
            .fetch(&self.request, &via, self.settings.request_timeout)
            .await?;

        tracing::debug!(
            "Received HTTP {} ({} bytes)",
            response.status,
            response.body.len()
        );

        extract_call_relative_urls(&response.body).map_err(|message| FetchError::Parse {
            url: self.request.url.clone(),
            message,
        })
    }

    fn check_attempts_remaining(&self) -> Result<(), ScraperError> {
        match self.settings.max_attempts {
            Some(max) if self.stats.attempts >= max => Err(ScraperError::AttemptsExhausted {
                attempts: self.stats.attempts,
            }),
            _ => Ok(()),
        }
    }

    async fn throttle(&mut self, wait: Duration) {
        self.stats.throttles += 1;
        tracing::info!("Waiting {:.2} seconds for next request", wait.as_secs_f64());
        tokio::time::sleep(wait).await;
    }

    pub fn current_proxy(&self) -> &ProxyIdentity {
        self.rotator.current()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
