//! Ordered set of price sources

use crate::{
    config::OracleConfig,
    error::ConfigError,
    provider::PriceSource,
    providers::{CoinGeckoSource, CoinMarketCapSource, CustomApiSource, ShahSwapSource},
};
use std::sync::Arc;

/// Price sources in priority order
///
/// When several sources succeed in the same resolution, the one listed first
/// wins, regardless of which answered first.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn PriceSource>>,
}

impl SourceRegistry {
    /// Creates the production registry:
    /// ShahSwap DEX, CoinGecko, CoinMarketCap, custom API
    pub fn from_config(config: &OracleConfig) -> Result<Self, ConfigError> {
        if config.coinmarketcap_api_key.is_none() {
            tracing::warn!("COINMARKETCAP_API_KEY not set; CoinMarketCap source will always fail");
        }

        Ok(Self::new(vec![
            Arc::new(ShahSwapSource::from_config(config)?),
            Arc::new(CoinGeckoSource::from_config(config)?),
            Arc::new(CoinMarketCapSource::from_config(config)?),
            Arc::new(CustomApiSource::from_config(config)?),
        ]))
    }

    /// Creates a registry with custom sources, tried in the given order
    pub fn new(sources: Vec<Arc<dyn PriceSource>>) -> Self {
        Self { sources }
    }

    /// Sources in priority order
    pub fn sources(&self) -> &[Arc<dyn PriceSource>] {
        &self.sources
    }

    /// Source names in priority order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.source_names())
            .finish()
    }
}
