//! HTTP gateway backed by reqwest.

use crate::{Endpoint, FetchGateway};
use async_trait::async_trait;
use ethscan_core::error::{EthscanError, EthscanResult};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Max retry attempts for 429 responses.
const MAX_RETRIES: u32 = 3;

/// Per-request timeout. Well under the default refresh period.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Fetches payloads from `<base>/<endpoint>`.
///
/// ```ignore
/// let gateway = HttpGateway::new("http://127.0.0.1:8080")?;
/// let blocks = gateway.fetch_historic_data().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(api_url: &str) -> EthscanResult<Self> {
        Self::with_timeout(api_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_url: &str, timeout: Duration) -> EthscanResult<Self> {
        let base_url = parse_base_url(api_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EthscanError::Internal(format!("Failed to build HTTP client: {e}")))?;

        tracing::info!(api_url = %base_url, "gateway ready");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> EthscanResult<Url> {
        self.base_url
            .join(endpoint.path())
            .map_err(|e| EthscanError::InvalidInput(format!("Bad endpoint URL for {endpoint}: {e}")))
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    /// GET with exponential backoff retry on 429.
    async fn fetch(&self, endpoint: Endpoint) -> EthscanResult<Value> {
        let url = self.endpoint_url(endpoint)?;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            tracing::debug!(%url, attempt, "fetching");

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| EthscanError::Transport(format!("GET {url}: {e}")))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RETRIES {
                tracing::warn!(%url, attempt, "rate limited, retrying");
                continue;
            }
            if !status.is_success() {
                return Err(EthscanError::Transport(format!("GET {url}: HTTP {status}")));
            }

            let body: Value = response.json().await.map_err(|e| {
                EthscanError::Transport(format!("GET {url}: undecodable JSON body: {e}"))
            })?;

            tracing::debug!(%endpoint, "fetched");
            return Ok(body);
        }

        Err(EthscanError::Transport(format!("max retries exceeded for {url}")))
    }
}

/// Validates the base address and gives it a trailing slash so relative
/// joins append to its path instead of replacing the last segment.
fn parse_base_url(api_url: &str) -> EthscanResult<Url> {
    if api_url.trim().is_empty() {
        return Err(EthscanError::InvalidInput("API URL must not be empty".into()));
    }

    let mut url = Url::parse(api_url.trim())
        .map_err(|e| EthscanError::InvalidInput(format!("Invalid API URL {api_url}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(EthscanError::InvalidInput(format!(
            "API URL must be http(s), got {}",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
