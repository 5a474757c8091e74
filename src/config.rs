//! Oracle configuration
//!
//! Built once, validated at construction and immutable afterwards.

use crate::{
    constants::{
        COINGECKO_API_URL, COINMARKETCAP_API_URL, DEFAULT_CACHE_DURATION_MS,
        DEFAULT_FALLBACK_PRICE, REQUEST_TIMEOUT_MS, SHAH_API_URL,
    },
    error::ConfigError,
};
use reqwest::Url;
use std::time::Duration;

/// Configuration for a `PriceOracle`
#[derive(Clone)]
pub struct OracleConfig {
    /// Base URL of the first-party API (ShahSwap DEX and custom endpoint)
    pub api_base_url: String,

    /// How long a resolved price is served without touching the network
    pub cache_duration: Duration,

    /// Price served when nothing is cached and every source fails
    pub fallback_price: f64,

    /// Per-source request deadline
    pub request_timeout: Duration,

    /// CoinGecko API base URL
    pub coingecko_api_url: String,

    /// Optional CoinGecko demo API key
    pub coingecko_api_key: Option<String>,

    /// CoinMarketCap API base URL
    pub coinmarketcap_api_url: String,

    /// CoinMarketCap pro API key; the source fails without it
    pub coinmarketcap_api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base_url: SHAH_API_URL.to_string(),
            cache_duration: Duration::from_millis(DEFAULT_CACHE_DURATION_MS),
            fallback_price: DEFAULT_FALLBACK_PRICE,
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            coingecko_api_url: COINGECKO_API_URL.to_string(),
            coingecko_api_key: None,
            coinmarketcap_api_url: COINMARKETCAP_API_URL.to_string(),
            coinmarketcap_api_key: None,
        }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("OracleConfig")
            .field("api_base_url", &self.api_base_url)
            .field("cache_duration", &self.cache_duration)
            .field("fallback_price", &self.fallback_price)
            .field("request_timeout", &self.request_timeout)
            .field("coingecko_api_url", &self.coingecko_api_url)
            .field("coingecko_api_key", &redact(&self.coingecko_api_key))
            .field("coinmarketcap_api_url", &self.coinmarketcap_api_url)
            .field("coinmarketcap_api_key", &redact(&self.coinmarketcap_api_key))
            .finish()
    }
}

impl OracleConfig {
    /// Builds a configuration from environment variables on top of the defaults
    ///
    /// Recognized variables: `SHAH_API_BASE_URL`, `SHAH_PRICE_CACHE_MS`,
    /// `SHAH_FALLBACK_PRICE`, `SHAH_PRICE_TIMEOUT_MS`, `COINGECKO_API_URL`,
    /// `COINGECKO_API_KEY`, `COINMARKETCAP_API_URL`, `COINMARKETCAP_API_KEY`.
    /// Empty values are ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("SHAH_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(ms) = get("SHAH_PRICE_CACHE_MS") {
            config.cache_duration = Duration::from_millis(parse_millis("SHAH_PRICE_CACHE_MS", &ms)?);
        }
        if let Some(price) = get("SHAH_FALLBACK_PRICE") {
            config.fallback_price = price
                .trim()
                .parse::<f64>()
                .map_err(|e| ConfigError::invalid_env("SHAH_FALLBACK_PRICE", e))?;
        }
        if let Some(ms) = get("SHAH_PRICE_TIMEOUT_MS") {
            config.request_timeout =
                Duration::from_millis(parse_millis("SHAH_PRICE_TIMEOUT_MS", &ms)?);
        }
        if let Some(url) = get("COINGECKO_API_URL") {
            config.coingecko_api_url = url;
        }
        config.coingecko_api_key = get("COINGECKO_API_KEY");
        if let Some(url) = get("COINMARKETCAP_API_URL") {
            config.coinmarketcap_api_url = url;
        }
        config.coinmarketcap_api_key = get("COINMARKETCAP_API_KEY");

        config.validate()?;
        Ok(config)
    }

    /// Sets the first-party API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the cache duration
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    /// Sets the fallback price
    pub fn with_fallback_price(mut self, price: f64) -> Self {
        self.fallback_price = price;
        self
    }

    /// Sets the per-source request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the CoinGecko base URL
    pub fn with_coingecko_api_url(mut self, url: impl Into<String>) -> Self {
        self.coingecko_api_url = url.into();
        self
    }

    /// Sets the CoinGecko demo API key
    pub fn with_coingecko_api_key(mut self, key: impl Into<String>) -> Self {
        self.coingecko_api_key = Some(key.into());
        self
    }

    /// Sets the CoinMarketCap base URL
    pub fn with_coinmarketcap_api_url(mut self, url: impl Into<String>) -> Self {
        self.coinmarketcap_api_url = url.into();
        self
    }

    /// Sets the CoinMarketCap API key
    pub fn with_coinmarketcap_api_key(mut self, key: impl Into<String>) -> Self {
        self.coinmarketcap_api_key = Some(key.into());
        self
    }

    /// Checks the configuration for values the oracle cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("api_base_url", &self.api_base_url)?;
        validate_url("coingecko_api_url", &self.coingecko_api_url)?;
        validate_url("coinmarketcap_api_url", &self.coinmarketcap_api_url)?;

        if self.cache_duration.is_zero() {
            return Err(ConfigError::InvalidCacheDuration);
        }
        if !self.fallback_price.is_finite() || self.fallback_price <= 0.0 {
            return Err(ConfigError::InvalidFallbackPrice(self.fallback_price));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid_url(field, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid_url(
            field,
            format!("unsupported scheme '{}'", other),
        )),
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid_env(var, e))
}
