//! Requester module for the fetch/retry/rotation control loop
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching through the active proxy
//! - Failure classification
//! - The retry/backoff policy (throttle vs. rotate)
//! - The cycle driver that ties fetching, extraction and persistence together

mod controller;
mod driver;
mod failure;
mod fetcher;

pub use controller::{ordinal, ControllerState, Remediation, RetryController};
pub use driver::{CycleDriver, CycleOutcome, DriverSettings, RunStats};
pub use failure::{classify, FailureKind, FetchError, RATE_LIMITED_STATUS};
pub use fetcher::{
    build_proxied_client, HttpPageFetcher, PageFetcher, RawResponse, RequestMethod, RequestSpec,
    MAX_REDIRECTS,
};

use crate::config::Config;
use crate::persist::InternetFilePersister;
use crate::proxy::{ProxyListSource, ProxyRotator};
use crate::{ConfigError, ScraperError};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Runs a complete scrape
///
/// This is the main entry point. It will:
/// 1. Create the dispatch directory
/// 2. Set up the proxy rotator (rotating first if no starting proxy is configured)
/// 3. Build the request, controller, fetcher and persister
/// 4. Drive cycles until the completion policy is satisfied
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(RunStats)` - Completion reached
/// * `Err(ScraperError)` - A fatal error ended the run
pub async fn run_scraper(config: &Config) -> Result<RunStats, ScraperError> {
    tokio::fs::create_dir_all(&config.output.dispatch_directory).await?;

    let (rotator_rng, controller_rng) = match config.requester.seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };

    let starting = config
        .proxy
        .starting_identity()
        .transpose()
        .map_err(ConfigError::Validation)?;

    let source = ProxyListSource::from_config(&config.proxy)?;
    let rotator = ProxyRotator::initialize(source, rotator_rng, starting).await?;

    let controller = RetryController::new(
        config.requester.failure_threshold,
        config.requester.average_wait(),
        controller_rng,
    );

    let persister = InternetFilePersister::from_config(config)?;

    let mut driver = CycleDriver::new(
        RequestSpec::from_config(config),
        rotator,
        controller,
        HttpPageFetcher::new(),
        persister,
        DriverSettings::from(&config.requester),
    );

    driver.run().await
}
