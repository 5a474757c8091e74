//! SHAH price source implementations

pub mod coingecko;
pub mod coinmarketcap;
pub mod custom_api;
pub mod shahswap;

pub use coingecko::CoinGeckoSource;
pub use coinmarketcap::CoinMarketCapSource;
pub use custom_api::CustomApiSource;
pub use shahswap::ShahSwapSource;

use crate::{constants::USER_AGENT, error::ProviderError};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

/// Builds the HTTP client shared by all requests of one source
pub(crate) fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Joins a configured base URL and an endpoint path
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Sends a request and decodes a JSON body, mapping every failure mode
/// to a `ProviderError`
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<T, ProviderError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();

    // Check for rate limiting
    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimitExceeded);
    }

    // Check for other errors
    if !status.is_success() {
        return Err(ProviderError::ApiError(format!(
            "{} HTTP {}: {}",
            provider,
            status,
            response.text().await.unwrap_or_default()
        )));
    }

    let response_text = response.text().await.map_err(map_transport_error)?;

    serde_json::from_str(&response_text).map_err(|e| {
        ProviderError::InvalidResponse(format!(
            "Failed to parse {} response: {}. Response: {}",
            provider, e, response_text
        ))
    })
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::NetworkError(e)
    }
}

/// Price field that providers send either as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum JsonPrice {
    Number(f64),
    Text(String),
}

impl JsonPrice {
    fn as_f64(&self) -> Option<f64> {
        match self {
            JsonPrice::Number(n) => Some(*n),
            JsonPrice::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Zero or an empty string counts as an unset field
    fn is_unset(&self) -> bool {
        match self {
            JsonPrice::Number(n) => *n == 0.0,
            JsonPrice::Text(s) => s.is_empty(),
        }
    }
}

/// Resolves a price from candidate fields in order
///
/// Absent, null, zero and empty-string fields fall through to the next
/// candidate. The first field holding anything else decides the result:
/// a positive finite number succeeds, any other value fails.
pub(crate) fn select_price(
    provider: &str,
    candidates: &[Option<&JsonPrice>],
) -> Result<f64, ProviderError> {
    let mut saw_zero = false;

    for candidate in candidates.iter().flatten() {
        if candidate.is_unset() {
            saw_zero |= matches!(candidate, JsonPrice::Number(_));
            continue;
        }

        return match candidate.as_f64() {
            Some(price) if price.is_finite() && price > 0.0 => Ok(price),
            Some(price) => Err(ProviderError::InvalidPrice(price)),
            None => Err(ProviderError::InvalidResponse(format!(
                "{} price is not numeric: {:?}",
                provider, candidate
            ))),
        };
    }

    if saw_zero {
        Err(ProviderError::InvalidPrice(0.0))
    } else {
        Err(ProviderError::InvalidResponse(format!(
            "No price field in {} response",
            provider
        )))
    }
}
