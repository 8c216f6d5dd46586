//! Fetch gateway abstraction for the ethscan data API.

pub mod http;

use async_trait::async_trait;
use ethscan_core::error::EthscanResult;
use serde_json::Value;

pub use http::HttpGateway;

/// Default data API address.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// The three payloads the data API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Latest transactions; shown verbatim.
    Transactions,
    /// Latest blocks; shown verbatim.
    Blocks,
    /// Array of blocks with embedded transactions; feeds every chart.
    HistoricData,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Self::Transactions, Self::Blocks, Self::HistoricData];

    /// Path relative to the API base.
    pub fn path(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Blocks => "blocks",
            Self::HistoricData => "historic-data",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Abstraction for fetching JSON payloads from any source.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    async fn fetch(&self, endpoint: Endpoint) -> EthscanResult<Value>;

    async fn fetch_transactions(&self) -> EthscanResult<Value> {
        self.fetch(Endpoint::Transactions).await
    }

    async fn fetch_blocks(&self) -> EthscanResult<Value> {
        self.fetch(Endpoint::Blocks).await
    }

    async fn fetch_historic_data(&self) -> EthscanResult<Value> {
        self.fetch(Endpoint::HistoricData).await
    }
}

#[async_trait]
impl<G: FetchGateway + ?Sized> FetchGateway for std::sync::Arc<G> {
    async fn fetch(&self, endpoint: Endpoint) -> EthscanResult<Value> {
        (**self).fetch(endpoint).await
    }
}
