use crate::proxy::ProxyIdentity;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CONSECUTIVE_FAILURES_THRESHOLD: u32 = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AVERAGE_WAIT_SECS: f64 = 5.0;
pub const MAX_AVERAGE_WAIT_SECS: f64 = 86_400.0;
pub const DEFAULT_CALL_LOG_URL: &str = "https://www.edispatches.com/call-log/index.php";
pub const DEFAULT_RELATIVE_URL_PREFIX: &str = "https://www.edispatches.com";
pub const DEFAULT_PROXY_LIST_URL: &str = "https://free-proxy-list.net/";
pub const DEFAULT_PROXY_ROW_SELECTOR: &str = "#proxylisttable tbody tr";
pub const DEFAULT_STARTING_PROXY: &str = "54.36.246.74:80";
pub const DEFAULT_DISPATCH_DIRECTORY: &str = "./dispatches/";

/// Main configuration structure for Dispatch Scraper
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub requester: RequesterConfig,
    pub target: TargetConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub proxy: ProxyConfig,
    pub output: OutputConfig,
}

/// When the cycle driver considers the job done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Stop after the first successful fetch/extract/persist cycle
    #[default]
    SingleCycle,

    /// Keep cycling until a successful cycle saves no new recordings
    UntilNoNewFiles,
}

/// Retry, throttle and timeout behaviour of the requester
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RequesterConfig {
    /// Consecutive non-429 failures tolerated on one proxy before rotating
    pub failure_threshold: u32,

    /// Longest time to wait for a response, in seconds
    pub request_timeout_secs: u64,

    /// Average throttle wait, in seconds (actual waits are 0.5x to 1.5x this)
    pub average_wait_secs: f64,

    /// Optional ceiling on page retrieval attempts
    pub max_attempts: Option<u64>,

    /// Completion predicate for the cycle loop
    pub completion: CompletionPolicy,

    /// Seed for proxy selection and throttle draws
    pub seed: Option<u64>,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_CONSECUTIVE_FAILURES_THRESHOLD,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            average_wait_secs: DEFAULT_AVERAGE_WAIT_SECS,
            max_attempts: None,
            completion: CompletionPolicy::default(),
            seed: None,
        }
    }
}

impl RequesterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The average throttle, clamped to `[0, MAX_AVERAGE_WAIT_SECS]`
    pub fn average_wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.average_wait_secs.clamp(0.0, MAX_AVERAGE_WAIT_SECS))
            .unwrap_or_default()
    }
}

/// The call-log page and the form payload posted to it
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetConfig {
    pub call_log_url: String,

    /// Prefix joined with extracted relative URLs when downloading
    pub relative_url_prefix: String,

    /// Form fields posted with each request; an empty map sends a GET
    pub form: BTreeMap<String, String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        let form = [
            ("ddl-state", "UT"),
            ("ddl-county", "Grand"),
            ("ddl-company", "ALL"),
            ("ddl-limit", "ALL"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            call_log_url: DEFAULT_CALL_LOG_URL.to_string(),
            relative_url_prefix: DEFAULT_RELATIVE_URL_PREFIX.to_string(),
            form,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "DispatchScraper".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/the-times-independent/dispatch-scraper".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

/// Proxy listing service and starting identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxyConfig {
    pub list_url: String,

    /// CSS selector for the listing's table rows
    pub row_selector: String,

    /// Identity to use before the first rotation; empty or absent rotates first
    pub starting_proxy: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_PROXY_LIST_URL.to_string(),
            row_selector: DEFAULT_PROXY_ROW_SELECTOR.to_string(),
            starting_proxy: Some(DEFAULT_STARTING_PROXY.to_string()),
        }
    }
}

impl ProxyConfig {
    /// Parses the configured starting proxy, treating an empty string as absent
    pub fn starting_identity(&self) -> Option<Result<ProxyIdentity, String>> {
        self.starting_proxy
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory recordings are saved under, mirroring their URL paths
    pub dispatch_directory: String,

    /// Re-download recordings that already exist locally
    pub overwrite_existing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dispatch_directory: DEFAULT_DISPATCH_DIRECTORY.to_string(),
            overwrite_existing: false,
        }
    }
}
