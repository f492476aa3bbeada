// In crates/market/src/http.rs

use crate::types::{MarketData, OiTopEntry};
use crate::{Error, MarketDataProvider, Result, StateProvider};
use async_trait::async_trait;
use core_types::{AccountInfo, CandidateCoin, Position};
use serde::de::DeserializeOwned;

/// HTTP client for the market/account/pool collaborator service.
///
/// The service exposes plain JSON GET endpoints; wire formats are its
/// concern, this client only decodes into the snapshot types.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .error_for_status()
            .map_err(Error::RequestFailed)?;

        let text = response.text().await.map_err(Error::RequestFailed)?;
        tracing::debug!(%url, bytes = text.len(), "Provider response received.");
        serde_json::from_str(&text).map_err(Error::DeserializationFailed)
    }
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    async fn market_data(&self, symbol: &str) -> Result<MarketData> {
        self.get_json(&format!("/market/{symbol}")).await
    }

    async fn oi_top(&self) -> Result<Vec<OiTopEntry>> {
        self.get_json("/oi/top").await
    }
}

#[async_trait]
impl StateProvider for HttpProvider {
    async fn account(&self) -> Result<AccountInfo> {
        self.get_json("/account").await
    }

    async fn positions(&self) -> Result<Vec<Position>> {
        self.get_json("/positions").await
    }

    async fn candidates(&self) -> Result<Vec<CandidateCoin>> {
        self.get_json("/candidates").await
    }
}
