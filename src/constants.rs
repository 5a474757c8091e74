//! Constants for the SHAH price oracle
//!
//! Defaults for everything in `OracleConfig` are centralized here. Runtime
//! overrides go through `OracleConfig::from_env` or the builder setters.

/// How long a resolved price is served from cache (in milliseconds)
pub const DEFAULT_CACHE_DURATION_MS: u64 = 30_000;

/// Price returned when the cache is empty and every source fails (USD per SHAH)
pub const DEFAULT_FALLBACK_PRICE: f64 = 0.001;

/// Upper bound on a single source request (in milliseconds)
pub const REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (in milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Smallest polling interval accepted by the poller (in milliseconds)
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Satoshis in one SHAH
pub const SATOSHIS_PER_SHAH: f64 = 100_000_000.0;

/// First-party Shahcoin API base URL (ShahSwap DEX and custom price endpoint)
pub const SHAH_API_URL: &str = "https://api.shah.vip";

/// ShahSwap DEX price path, relative to the first-party API base
pub const SHAHSWAP_PRICE_PATH: &str = "/dex/price/SHAH/USD";

/// Custom first-party price path, relative to the first-party API base
pub const CUSTOM_API_PRICE_PATH: &str = "/price/shash/usd";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko coin id for SHAH
pub const COINGECKO_COIN_ID: &str = "shahcoin";

/// CoinMarketCap API base URL
pub const COINMARKETCAP_API_URL: &str = "https://pro-api.coinmarketcap.com";

/// CoinMarketCap latest quotes endpoint
pub const COINMARKETCAP_QUOTES_ENDPOINT: &str = "/v1/cryptocurrency/quotes/latest";

/// Ticker symbol used on market data providers
pub const SHAH_SYMBOL: &str = "SHAH";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "shah-price-sdk/0.1.0";
