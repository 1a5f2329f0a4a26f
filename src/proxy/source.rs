//! Proxy pool source
//!
//! Fetches a public listing of candidate proxies and parses its HTML table
//! into a de-duplicated set of identities. The first two cells of each row
//! are the host and the port.

use crate::config::ProxyConfig;
use crate::proxy::ProxyIdentity;
use crate::{ConfigError, ScraperError};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::time::Duration;

/// Timeout for the listing request
const LISTING_TIMEOUT_SECS: u64 = 30;

/// A supplier of candidate proxy identities
#[allow(async_fn_in_trait)]
pub trait ProxySource {
    /// Fetches the current candidate set
    ///
    /// Failures are not retried here; they propagate as
    /// [`ScraperError::ProxySourceUnavailable`].
    async fn fetch_candidates(&self) -> Result<BTreeSet<ProxyIdentity>, ScraperError>;

    /// Where candidates come from, for error reports
    fn listing_url(&self) -> &str;
}

/// Proxy source backed by an HTML listing page (free-proxy-list.net style)
#[derive(Debug, Clone)]
pub struct ProxyListSource {
    client: Client,
    list_url: String,
    row_selector: Selector,
}

impl ProxyListSource {
    /// Creates a source for the given listing URL and row selector
    pub fn new(list_url: &str, row_selector: &str) -> Result<Self, ScraperError> {
        let row_selector = Selector::parse(row_selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid row_selector '{}': {}", row_selector, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(LISTING_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            list_url: list_url.to_string(),
            row_selector,
        })
    }

    /// Creates a source from the `[proxy]` configuration section
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ScraperError> {
        Self::new(&config.list_url, &config.row_selector)
    }

    fn unavailable(&self, message: impl Into<String>) -> ScraperError {
        ScraperError::ProxySourceUnavailable {
            url: self.list_url.clone(),
            message: message.into(),
        }
    }
}

impl ProxySource for ProxyListSource {
    async fn fetch_candidates(&self) -> Result<BTreeSet<ProxyIdentity>, ScraperError> {
        tracing::debug!("Fetching proxy list from {}", self.list_url);

        let response = self
            .client
            .get(&self.list_url)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let proxies = parse_proxy_table(&body, &self.row_selector);
        tracing::debug!("Proxy list yielded {} candidates", proxies.len());
        Ok(proxies)
    }

    fn listing_url(&self) -> &str {
        &self.list_url
    }
}

/// Parses proxy identities out of a listing table
///
/// Each row matched by `row_selector` contributes `td[0]:td[1]`. Rows with
/// fewer than two cells or an unparsable port are skipped.
///
/// # Example
///
/// ```
/// use dispatch_scraper::proxy::parse_proxy_table;
/// use scraper::Selector;
///
/// let html = r#"<table id="proxylisttable"><tbody>
///     <tr><td>10.0.0.1</td><td>8080</td><td>US</td></tr>
/// </tbody></table>"#;
/// let selector = Selector::parse("#proxylisttable tbody tr").unwrap();
/// let proxies = parse_proxy_table(html, &selector);
/// assert_eq!(proxies.len(), 1);
/// ```
pub fn parse_proxy_table(html: &str, row_selector: &Selector) -> BTreeSet<ProxyIdentity> {
    let document = Html::parse_document(html);
    let mut proxies = BTreeSet::new();

    let Ok(cell_selector) = Selector::parse("td") else {
        return proxies;
    };

    for row in document.select(row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .take(2)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        let [host, port] = cells.as_slice() else {
            tracing::debug!("Skipping proxy row with fewer than two cells");
            continue;
        };

        match format!("{}:{}", host, port).parse::<ProxyIdentity>() {
            Ok(proxy) => {
                proxies.insert(proxy);
            }
            Err(e) => tracing::debug!("Skipping proxy row: {}", e),
        }
    }

    proxies
}
