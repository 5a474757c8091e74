//! # SHAH Price SDK
//!
//! Resolves a single authoritative SHAH/USD price from several unreliable
//! sources (ShahSwap DEX, CoinGecko, CoinMarketCap and the first-party
//! price API), caches it, converts between SHAH, satoshis and USD, and
//! notifies subscribers when a new price is resolved.
//!
//! ## Usage
//!
//! ```no_run
//! use shah_price_sdk::{OracleConfig, PriceOracle};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = PriceOracle::new(OracleConfig::default())?;
//!
//! // Served from cache for 30 seconds after each resolution
//! let price = oracle.get_price(false).await;
//! println!("SHAH: ${:.6}", price);
//!
//! let fee_satoshis = oracle.usd_to_satoshis(9.99).await;
//! println!("$9.99 = {} satoshis", fee_satoshis);
//!
//! let id = oracle.subscribe(|price| println!("new SHAH price: {price}"));
//! oracle.start_polling(Duration::from_secs(30));
//! # oracle.unsubscribe(id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Resolution
//!
//! ```text
//! get_price(force_refresh)
//!     ↓ fresh cache? → return cached price
//! fan out to every source concurrently (5 s deadline each)
//!     ↓ wait for all
//! first success in priority order wins
//!     ↓ cache + notify subscribers
//! all failed? → last cached price, else fallback price
//! ```
//!
//! `get_price` and the conversion helpers never fail. Callers that care
//! whether the value is fresh should inspect `get_cache_info().is_stale`.

pub mod config;
pub mod constants;
pub mod conversion;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod poller;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod subscription;
pub mod types;

// Re-export commonly used types
pub use config::OracleConfig;
pub use error::{ConfigError, ProviderError};
pub use metrics::SourceMetrics;
pub use oracle::PriceOracle;
pub use provider::PriceSource;
pub use registry::SourceRegistry;
pub use subscription::SubscriptionId;
pub use types::{CacheInfo, ComponentHealth, HealthStatus};
