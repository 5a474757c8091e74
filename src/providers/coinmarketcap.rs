//! CoinMarketCap price source implementation

use super::{build_client, get_json, join_url, select_price, JsonPrice};
use crate::{
    config::OracleConfig,
    constants::{COINMARKETCAP_QUOTES_ENDPOINT, SHAH_SYMBOL},
    error::{ConfigError, ProviderError},
    provider::PriceSource,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinMarketCap v1 latest quotes response, keyed by symbol
#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    #[serde(default)]
    quote: HashMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    price: Option<JsonPrice>,
}

/// CoinMarketCap price source
///
/// Requires a pro API key. Without one every fetch fails immediately and no
/// request is sent.
pub struct CoinMarketCapSource {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl CoinMarketCapSource {
    /// Creates a new CoinMarketCap source
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: join_url(api_url, COINMARKETCAP_QUOTES_ENDPOINT),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Creates a CoinMarketCap source from oracle configuration
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.coinmarketcap_api_url,
            config.coinmarketcap_api_key.clone(),
            config.request_timeout,
        )
    }
}

#[async_trait]
impl PriceSource for CoinMarketCapSource {
    async fn fetch_price(&self) -> Result<f64, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("coinmarketcap"))?;

        tracing::debug!(url = %self.url, "Fetching price from CoinMarketCap");

        let request = self
            .client
            .get(&self.url)
            .query(&[("symbol", SHAH_SYMBOL), ("convert", "USD")])
            .header("X-CMC_PRO_API_KEY", api_key);

        let response: QuotesResponse = get_json(request, "CoinMarketCap").await?;
        let usd = response
            .data
            .get(SHAH_SYMBOL)
            .and_then(|coin| coin.quote.get("USD"))
            .and_then(|quote| quote.price.as_ref());

        select_price("CoinMarketCap", &[usd])
    }

    fn source_name(&self) -> &'static str {
        "coinmarketcap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reads_usd_quote_with_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cryptocurrency/quotes/latest"))
            .and(query_param("symbol", "SHAH"))
            .and(query_param("convert", "USD"))
            .and(header("X-CMC_PRO_API_KEY", "cmc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": { "error_code": 0 },
                "data": { "SHAH": { "symbol": "SHAH", "quote": { "USD": { "price": 0.0024 } } } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = CoinMarketCapSource::new(
            &server.uri(),
            Some("cmc-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(source.fetch_price().await.unwrap(), 0.0024);
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = CoinMarketCapSource::new(&server.uri(), None, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.fetch_price().await,
            Err(ProviderError::MissingCredentials("coinmarketcap"))
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": { "error_code": 1001, "error_message": "This API Key is invalid." }
            })))
            .mount(&server)
            .await;

        let source = CoinMarketCapSource::new(
            &server.uri(),
            Some("bad".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(
            source.fetch_price().await,
            Err(ProviderError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_price_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "SHAH": { "quote": { "USD": { "price": 0 } } } }
            })))
            .mount(&server)
            .await;

        let source = CoinMarketCapSource::new(
            &server.uri(),
            Some("cmc-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(
            source.fetch_price().await,
            Err(ProviderError::InvalidPrice(_))
        ));
    }
}
