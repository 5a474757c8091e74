//! CoinGecko price source implementation

use super::{build_client, get_json, join_url, select_price, JsonPrice};
use crate::{
    config::OracleConfig,
    constants::{COINGECKO_COIN_ID, COINGECKO_SIMPLE_PRICE_ENDPOINT},
    error::{ConfigError, ProviderError},
    provider::PriceSource,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    #[serde(flatten)]
    prices: HashMap<String, CoinGeckoPriceData>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoPriceData {
    #[serde(default)]
    usd: Option<JsonPrice>,
}

/// CoinGecko price source
pub struct CoinGeckoSource {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl CoinGeckoSource {
    /// Creates a new CoinGecko source
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: join_url(api_url, COINGECKO_SIMPLE_PRICE_ENDPOINT),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Creates a CoinGecko source from oracle configuration
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.coingecko_api_url,
            config.coingecko_api_key.clone(),
            config.request_timeout,
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_price(&self) -> Result<f64, ProviderError> {
        tracing::debug!(url = %self.url, "Fetching price from CoinGecko");

        let mut request = self
            .client
            .get(&self.url)
            .query(&[("ids", COINGECKO_COIN_ID), ("vs_currencies", "usd")]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response: CoinGeckoResponse = get_json(request, "CoinGecko").await?;
        let usd = response
            .prices
            .get(COINGECKO_COIN_ID)
            .and_then(|data| data.usd.as_ref());

        select_price("CoinGecko", &[usd])
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }
}
