//! Aggregator HTTP API client. Aggregators turn an [`Intent`] into an
//! [`ExecutionPlan`] and accept signed off-chain orders through postbacks.

use {
    crate::{
        domain::{
            eth,
            intent::Intent,
            plan::{self, ExecutionPlan, PostCallback},
        },
        infra::observe,
    },
    anyhow::Context,
    reqwest::{
        ClientBuilder,
        StatusCode,
        Url,
        header::{HeaderMap, HeaderValue},
    },
    std::time::Duration,
    thiserror::Error,
};

/// Source of execution plans. May be asked more than once for the same
/// logical action, every call yields a fresh plan.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait PlanFetching: Send + Sync {
    async fn fetch(&self, intent: &Intent) -> Result<ExecutionPlan, FetchError>;
}

/// Delivers signatures of off-chain orders back to the aggregator that
/// requested them.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait Postback: Send + Sync {
    /// Sends the callback with the signature attached and returns the decoded
    /// response body.
    async fn post(
        &self,
        callback: &PostCallback,
        signature: &eth::Bytes,
    ) -> Result<serde_json::Value, PostbackError>;
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the aggregator API.
    pub base_url: Url,
    /// API key, sent as the `x-api-key` header.
    pub api_key: Option<String>,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Network path segment of every endpoint.
    pub network: eth::NetworkId,
}

/// Aggregator API client implementation.
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    network: eth::NetworkId,
}

impl Client {
    pub fn new(client_builder: ClientBuilder, config: Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = config.api_key {
            let mut key = HeaderValue::from_str(&api_key).context("invalid api key")?;
            key.set_sensitive(true);
            headers.insert("x-api-key", key);
        }

        Ok(Self {
            client: client_builder
                .default_headers(headers)
                .timeout(config.timeout)
                .build()
                .context("failed to build reqwest client")?,
            base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            network: config.network,
        })
    }

    /// `{base}/{network}/{endpoint}`
    fn url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}/{}",
            self.base_url,
            self.network,
            endpoint.trim_start_matches('/')
        ))
    }

    fn endpoint(intent: &Intent) -> Option<&'static str> {
        match intent {
            Intent::Swap(_) => Some("swap"),
            Intent::Buy(_) => Some("execute/buy"),
            Intent::Bid(_) => Some("execute/bid"),
            Intent::Supply(_) | Intent::Withdraw(_) => None,
        }
    }
}

#[async_trait::async_trait]
impl PlanFetching for Client {
    async fn fetch(&self, intent: &Intent) -> Result<ExecutionPlan, FetchError> {
        let endpoint = Self::endpoint(intent).ok_or(FetchError::Unsupported(intent.name()))?;
        let url = self.url(endpoint)?;

        let response = self.client.post(url).json(intent).send().await;
        observe::aggregator_request(endpoint, &response);
        let response = response?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status,
                text: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(ExecutionPlan::from_json(body)?)
    }
}

#[async_trait::async_trait]
impl Postback for Client {
    async fn post(
        &self,
        callback: &PostCallback,
        signature: &eth::Bytes,
    ) -> Result<serde_json::Value, PostbackError> {
        let url = self.url(&callback.endpoint)?;

        let response = self
            .client
            .request(callback.method.clone(), url)
            .query(&[("signature", signature.to_string())])
            .json(&callback.body)
            .send()
            .await;
        observe::aggregator_request(&callback.endpoint, &response);
        let response = response?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PostbackError::Status { code: status, text });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(PostbackError::Body)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("the {0} intent is not served by this plan source")]
    Unsupported(&'static str),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("aggregator responded with {code}: {text}")]
    Status { code: StatusCode, text: String },
    #[error(transparent)]
    Invalid(#[from] plan::Invalid),
}

#[derive(Debug, Error)]
pub enum PostbackError {
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("aggregator responded with {code}: {text}")]
    Status { code: StatusCode, text: String },
    #[error("response is not json: {0}")]
    Body(#[source] serde_json::Error),
}
