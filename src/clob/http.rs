use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::Result;
use crate::clob::market::MarketData;
use crate::clob::types::{OrderBook, TickSize};
use crate::error::Error;
use crate::types::{Decimal, U256};

#[derive(Deserialize)]
struct TickSizeResponse {
    minimum_tick_size: Decimal,
}

#[derive(Deserialize)]
struct FeeRateResponse {
    base_fee: u32,
}

#[derive(Deserialize)]
struct NegRiskResponse {
    neg_risk: bool,
}

/// [`MarketData`] served by the public CLOB REST endpoints.
///
/// Requests are sent once; non-success statuses become [`crate::error::Kind::Status`]
/// errors carrying the response body.
#[derive(Clone, Debug)]
pub struct HttpMarketData {
    host: Url,
    client: ReqwestClient,
}

impl HttpMarketData {
    pub fn new(host: &str) -> Result<Self> {
        Self::with_client(host, ReqwestClient::new())
    }

    pub fn with_client(host: &str, client: ReqwestClient) -> Result<Self> {
        Ok(Self {
            host: Url::parse(host)?,
            client,
        })
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self), err(level = "warn"))
    )]
    async fn get<T: DeserializeOwned>(&self, path: &str, token_id: U256) -> Result<T> {
        let response = self
            .client
            .request(Method::GET, self.host.join(path)?)
            .query(&[("token_id", token_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::status(
                status,
                Method::GET,
                format!("/{path}"),
                message,
            ));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MarketData for HttpMarketData {
    async fn tick_size(&self, token_id: U256) -> Result<TickSize> {
        let response = self.get::<TickSizeResponse>("tick-size", token_id).await?;
        TickSize::try_from(response.minimum_tick_size)
    }

    async fn fee_rate_bps(&self, token_id: U256) -> Result<u32> {
        self.get::<FeeRateResponse>("fee-rate", token_id)
            .await
            .map(|response| response.base_fee)
    }

    async fn neg_risk(&self, token_id: U256) -> Result<bool> {
        self.get::<NegRiskResponse>("neg-risk", token_id)
            .await
            .map(|response| response.neg_risk)
    }

    async fn order_book(&self, token_id: U256) -> Result<OrderBook> {
        self.get("book", token_id).await
    }
}
