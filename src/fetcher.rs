use crate::configuration::Configuration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use thiserror::Error;

/// User-Agent presented when the configuration does not set one.
pub const DEFAULT_AGENT: &str = concat!("harvestman/", env!("CARGO_PKG_VERSION"));

/// One completed page retrieval. Non-2xx responses are results, not errors;
/// the processing pipeline decides what to do with the status.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code of the final response.
    pub status: u16,
    /// URL the response actually came from, after redirects.
    pub resolved_url: String,
    /// Raw response body.
    pub content: Bytes,
}

/// Failure to complete a retrieval at all.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport gave up before an HTTP exchange completed.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The collaborator cannot retrieve this URL at all.
    #[error("unfetchable url: {0}")]
    Unfetchable(String),
}

/// Collaborator that turns a canonical URL into page content.
///
/// The crawl loop only ever talks to this trait, so tests drive the whole
/// pipeline from an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve one page.
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// HTTP fetcher backed by a shared `reqwest` client with keep-alive and
/// compressed transfer enabled.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the client from the crawl configuration.
    pub fn new(configuration: &Configuration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let agent = configuration.user_agent.as_deref().unwrap_or(DEFAULT_AGENT);

        let mut builder = reqwest::Client::builder()
            .user_agent(agent)
            .default_headers(headers)
            .brotli(true);

        if let Some(timeout) = configuration.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let resolved_url = response.url().to_string();
        let content = response.bytes().await?;

        Ok(FetchResult {
            status,
            resolved_url,
            content,
        })
    }
}

#[test]
fn test_default_agent_carries_version() {
    assert!(DEFAULT_AGENT.starts_with("harvestman/"));
    assert!(DEFAULT_AGENT.len() > "harvestman/".len());
}

#[test]
fn test_http_fetcher_builds_from_configuration() {
    let mut configuration = Configuration::new();
    configuration.with_user_agent(Some("spacecrab/1.0"));

    assert!(HttpFetcher::new(&configuration).is_ok());
}
