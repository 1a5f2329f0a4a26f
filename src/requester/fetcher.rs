//! HTTP page fetcher
//!
//! This module issues the call-log request through the active proxy:
//! - Building HTTP clients routed through a proxy identity
//! - GET or form POST depending on the configured form
//! - Bounded timeout and redirect chain
//! - Mapping transport errors and error statuses to [`FetchError`]

use crate::config::Config;
use crate::proxy::ProxyIdentity;
use crate::requester::FetchError;
use reqwest::header::USER_AGENT;
use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;

/// Longest redirect chain followed before giving up
pub const MAX_REDIRECTS: usize = 10;

/// HTTP method of the page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    PostForm,
}

/// Everything needed to issue the page request, independent of the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: RequestMethod,
    pub url: String,

    /// `User-Agent` header identifying the tool
    pub user_agent: String,

    /// Form payload, sent only for [`RequestMethod::PostForm`]
    pub form: Vec<(String, String)>,
}

impl RequestSpec {
    /// Builds the call-log request from configuration
    ///
    /// A non-empty form map produces a form POST; an empty one a plain GET.
    pub fn from_config(config: &Config) -> Self {
        let form: Vec<(String, String)> = config
            .target
            .form
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let method = if form.is_empty() {
            RequestMethod::Get
        } else {
            RequestMethod::PostForm
        };

        Self {
            method,
            url: config.target.call_log_url.clone(),
            user_agent: config.user_agent.header_value(),
            form,
        }
    }
}

/// A successful response, body unparsed
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Issues page requests through a proxy
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetches the page described by `request` via `via`
    ///
    /// # Errors
    ///
    /// * `HttpStatus` - the response status was >= 400
    /// * `Timeout` - no response within `timeout`
    /// * `TooManyRedirects` - the redirect chain exceeded the limit
    /// * `Transport` - connection, DNS or body failure
    async fn fetch(
        &mut self,
        request: &RequestSpec,
        via: &ProxyIdentity,
        timeout: Duration,
    ) -> Result<RawResponse, FetchError>;
}

/// Builds an HTTP client that routes every request through `via`
///
/// # Arguments
///
/// * `via` - The proxy identity
/// * `timeout` - Total request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy URL or client configuration
pub fn build_proxied_client(
    via: &ProxyIdentity,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .proxy(Proxy::all(via.proxy_url())?)
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by reqwest
///
/// Keeps one client for the current proxy and timeout; a rotation causes a
/// new client to be built on the next fetch.
#[derive(Debug, Default)]
pub struct HttpPageFetcher {
    cached: Option<(ProxyIdentity, Duration, Client)>,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(
        &mut self,
        via: &ProxyIdentity,
        timeout: Duration,
    ) -> Result<Client, reqwest::Error> {
        if let Some((proxy, cached_timeout, client)) = &self.cached {
            if proxy == via && *cached_timeout == timeout {
                return Ok(client.clone());
            }
        }

        tracing::debug!("Building HTTP client for proxy {}", via);
        let client = build_proxied_client(via, timeout)?;
        self.cached = Some((via.clone(), timeout, client.clone()));
        Ok(client)
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch(
        &mut self,
        request: &RequestSpec,
        via: &ProxyIdentity,
        timeout: Duration,
    ) -> Result<RawResponse, FetchError> {
        let client = self
            .client_for(via, timeout)
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;

        let builder = match request.method {
            RequestMethod::Get => client.get(&request.url),
            RequestMethod::PostForm => client.post(&request.url).form(&request.form),
        };

        tracing::info!("Sending request to {} via {}", request.url, via);
        let response = builder
            .header(USER_AGENT, &request.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::HttpStatus {
                url: request.url.clone(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;

        Ok(RawResponse { status, body })
    }
}
