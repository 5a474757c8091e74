//! First-party Shahcoin price API source

use super::{build_client, get_json, join_url, select_price, JsonPrice};
use crate::{
    config::OracleConfig,
    constants::CUSTOM_API_PRICE_PATH,
    error::{ConfigError, ProviderError},
    provider::PriceSource,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct CustomPriceResponse {
    #[serde(default)]
    price: Option<JsonPrice>,
    #[serde(default)]
    usd: Option<JsonPrice>,
}

/// Price endpoint on the first-party API, lowest priority
pub struct CustomApiSource {
    client: Client,
    url: String,
}

impl CustomApiSource {
    pub fn new(api_base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: join_url(api_base_url, CUSTOM_API_PRICE_PATH),
        })
    }

    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }
}

#[async_trait]
impl PriceSource for CustomApiSource {
    async fn fetch_price(&self) -> Result<f64, ProviderError> {
        tracing::debug!(url = %self.url, "Fetching price from custom API");

        let response: CustomPriceResponse =
            get_json(self.client.get(&self.url), "custom API").await?;

        select_price("custom API", &[response.price.as_ref(), response.usd.as_ref()])
    }

    fn source_name(&self) -> &'static str {
        "custom_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reads_usd_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/price/shash/usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "usd": "0.0031" })))
            .expect(1)
            .mount(&server)
            .await;

        let source = CustomApiSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(source.fetch_price().await.unwrap(), 0.0031);
    }

    #[tokio::test]
    async fn test_empty_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "price": null })))
            .mount(&server)
            .await;

        let source = CustomApiSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.fetch_price().await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_price_does_not_fall_through_to_usd() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/price/shash/usd"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "price": -0.5, "usd": 0.003 })),
            )
            .mount(&server)
            .await;

        let source = CustomApiSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.fetch_price().await,
            Err(ProviderError::InvalidPrice(p)) if p == -0.5
        ));
    }
}
