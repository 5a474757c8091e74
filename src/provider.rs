//! Source abstraction for fetching the SHAH/USD price from external APIs

use crate::error::ProviderError;
use async_trait::async_trait;

/// Trait for SHAH price sources
///
/// Implementations perform one bounded request against a provider (ShahSwap,
/// CoinGecko, CoinMarketCap, the first-party API) and return either a
/// strictly positive USD price or the reason it could not be obtained.
/// Expected failures (network, status, body, timeout) are returned as
/// `ProviderError`; implementations must not panic for them.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the current SHAH price in USD
    async fn fetch_price(&self) -> Result<f64, ProviderError>;

    /// Returns the identifier recorded in the cache when this source wins
    fn source_name(&self) -> &'static str;
}
