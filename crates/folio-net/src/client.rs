//! HTTP Client
//!
//! [`HttpFetcher`] performs real network requests with reqwest's blocking
//! client. Each request runs on smol's blocking pool so the event loop keeps
//! animating while the body downloads.

use std::time::Duration;

use url::Url;

use crate::fetch::{LocalBoxFuture, PageFetcher, Response};
use crate::NetError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Folio-Runtime/0.1".into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self, NetError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a fetcher with explicit settings
    pub fn with_config(config: ClientConfig) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn get_blocking(client: &reqwest::blocking::Client, url: &Url) -> Result<Response, NetError> {
        tracing::info!("HTTP GET {}", url);

        let resp = client
            .get(url.as_str())
            .header("Accept", "text/html")
            .send()
            .map_err(|e| NetError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = resp
            .bytes()
            .map_err(|e| NetError::Network(e.to_string()))?
            .to_vec();

        Ok(Response { status, headers, body })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, NetError>> {
        let client = self.client.clone();
        let url = url.clone();
        Box::pin(async move {
            let response = smol::unblock(move || Self::get_blocking(&client, &url)).await?;
            response.into_html()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("Folio"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
