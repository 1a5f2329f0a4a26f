//! Dispatch Scraper main entry point
//!
//! This is the command-line interface for scraping the eDispatches call log.

use clap::Parser;
use dispatch_scraper::config::{load_config_with_hash, validate, CompletionPolicy, Config};
use dispatch_scraper::requester::run_scraper;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dispatch Scraper: collects call recordings from the eDispatches call log
///
/// Requests are routed through public proxies. Rate limiting and repeated
/// failures trigger a proxy rotation; other failures are retried after a
/// randomized wait.
#[derive(Parser, Debug)]
#[command(name = "dispatch-scraper")]
#[command(version)]
#[command(about = "For scraping the eDispatches call log", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for reading and writing dispatch call recordings
    #[arg(short, long, value_name = "DIR")]
    dispatch_directory: Option<String>,

    /// Consecutive page retrieval failures before rotating the proxy
    #[arg(short, long, value_name = "N")]
    failure_threshold: Option<u32>,

    /// Longest time (in seconds) to wait before abandoning a request
    #[arg(short = 't', long, value_name = "SECS")]
    request_timeout_in_seconds: Option<u64>,

    /// Average wait between requests (actual waits vary from 0.5x to 1.5x)
    #[arg(long, value_name = "SECS")]
    average_wait_in_seconds: Option<f64>,

    /// Proxy to use before the first rotation (host:port)
    #[arg(long, value_name = "HOST:PORT", conflicts_with = "no_starting_proxy")]
    starting_proxy: Option<String>,

    /// Draw a proxy from the listing before the first request
    #[arg(long)]
    no_starting_proxy: bool,

    /// Keep polling until a cycle finds no new recordings
    #[arg(long)]
    until_no_new_files: bool,

    /// Give up after this many page retrieval attempts
    #[arg(long, value_name = "N")]
    max_attempts: Option<u64>,

    /// Re-download recordings that already exist locally
    #[arg(long)]
    overwrite_existing: bool,

    /// Seed for reproducible proxy selection and waits
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the resolved configuration without scraping
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    match run_scraper(&config).await {
        Ok(stats) => {
            tracing::info!(
                "Completion reached: {} attempts, {} failures, {} rotations, {} new files",
                stats.attempts,
                stats.failures,
                stats.rotations,
                stats.files_saved
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dispatch_scraper=info,warn"),
            1 => EnvFilter::new("dispatch_scraper=debug,info"),
            2 => EnvFilter::new("dispatch_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and layers command-line overrides on top
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(dir) = &cli.dispatch_directory {
        config.output.dispatch_directory = dir.clone();
    }
    if let Some(threshold) = cli.failure_threshold {
        config.requester.failure_threshold = threshold;
    }
    if let Some(timeout) = cli.request_timeout_in_seconds {
        config.requester.request_timeout_secs = timeout;
    }
    if let Some(wait) = cli.average_wait_in_seconds {
        config.requester.average_wait_secs = wait;
    }
    if let Some(proxy) = &cli.starting_proxy {
        config.proxy.starting_proxy = Some(proxy.clone());
    }
    if cli.no_starting_proxy {
        config.proxy.starting_proxy = None;
    }
    if cli.until_no_new_files {
        config.requester.completion = CompletionPolicy::UntilNoNewFiles;
    }
    if cli.max_attempts.is_some() {
        config.requester.max_attempts = cli.max_attempts;
    }
    if cli.overwrite_existing {
        config.output.overwrite_existing = true;
    }
    if cli.seed.is_some() {
        config.requester.seed = cli.seed;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode
fn print_dry_run(config: &Config) {
    println!("=== Dispatch Scraper Dry Run ===\n");

    println!("Target:");
    println!("  Call log: {}", config.target.call_log_url);
    println!("  Recording prefix: {}", config.target.relative_url_prefix);
    for (key, value) in &config.target.form {
        println!("  Form: {} = {}", key, value);
    }
    println!("  User-Agent: {}", config.user_agent.header_value());

    println!("\nRequester:");
    println!("  Failure threshold: {}", config.requester.failure_threshold);
    println!("  Request timeout: {}s", config.requester.request_timeout_secs);
    println!("  Average wait: {}s", config.requester.average_wait_secs);
    println!("  Completion: {:?}", config.requester.completion);
    match config.requester.max_attempts {
        Some(max) => println!("  Max attempts: {}", max),
        None => println!("  Max attempts: unlimited"),
    }

    println!("\nProxy:");
    println!("  Listing: {}", config.proxy.list_url);
    match config.proxy.starting_identity() {
        Some(Ok(proxy)) => println!("  Starting proxy: {}", proxy),
        _ => println!("  Starting proxy: none (rotate before first request)"),
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.dispatch_directory);
    println!("  Overwrite existing: {}", config.output.overwrite_existing);

    println!("\n✓ Configuration is valid");
}
