//! ShahSwap DEX price source

use super::{build_client, get_json, join_url, select_price, JsonPrice};
use crate::{
    config::OracleConfig,
    constants::SHAHSWAP_PRICE_PATH,
    error::{ConfigError, ProviderError},
    provider::PriceSource,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// ShahSwap DEX price response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShahSwapResponse {
    #[serde(default)]
    price: Option<JsonPrice>,
    #[serde(default)]
    last_price: Option<JsonPrice>,
}

/// First-party DEX price, the most trusted source
pub struct ShahSwapSource {
    client: Client,
    url: String,
}

impl ShahSwapSource {
    /// Creates a ShahSwap source against the first-party API base URL
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: join_url(api_base_url, SHAHSWAP_PRICE_PATH),
        })
    }

    /// Creates a ShahSwap source from oracle configuration
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }
}

#[async_trait]
impl PriceSource for ShahSwapSource {
    async fn fetch_price(&self) -> Result<f64, ProviderError> {
        tracing::debug!(url = %self.url, "Fetching price from ShahSwap");

        let response: ShahSwapResponse =
            get_json(self.client.get(&self.url), "ShahSwap").await?;

        select_price(
            "ShahSwap",
            &[response.price.as_ref(), response.last_price.as_ref()],
        )
    }

    fn source_name(&self) -> &'static str {
        "shahswap"
    }
}
