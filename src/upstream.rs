//! Fetching raw DBML from the schema extraction service
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::schema::Upstream;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid schema source URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Unsupported schema source URL scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    #[error("Schema source responded with {status}")]
    Status { status: StatusCode },

    #[error("HTTP error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// Anything that can turn a target URL into raw schema text
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch(&self, target: &str) -> Result<String, FetchError>;
}

#[derive(Debug)]
pub struct HttpSchemaSource {
    client: Client,
    endpoint: Option<Url>,
}

impl HttpSchemaSource {
    pub fn new(config: &Upstream) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let endpoint = config
            .endpoint
            .as_deref()
            .map(parse_http_url)
            .transpose()?;

        Ok(Self { client, endpoint })
    }

    /// The URL to actually GET for a given target
    fn request_url(&self, target: &str) -> Result<Url, FetchError> {
        let target = parse_http_url(target)?;

        Ok(match &self.endpoint {
            Some(endpoint) => {
                let mut url = endpoint.clone();
                url.query_pairs_mut().append_pair("url", target.as_str());
                url
            }
            None => target,
        })
    }
}

fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchError::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}

#[async_trait]
impl SchemaSource for HttpSchemaSource {
    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        let url = self.request_url(target)?;
        debug!("Fetching schema from {url}");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        Ok(response.text().await?)
    }
}
