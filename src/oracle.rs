//! SHAH price oracle service
//!
//! Owns the resolver (cache, sources, subscribers) and the poller. Hold one
//! instance per process and share it, typically behind an `Arc`.

use crate::{
    config::OracleConfig,
    constants::DEFAULT_POLL_INTERVAL_MS,
    error::ConfigError,
    metrics::SourceMetrics,
    poller::Poller,
    registry::SourceRegistry,
    resolver::PriceResolver,
    subscription::SubscriptionId,
    types::{CacheInfo, ComponentHealth, HealthStatus},
};
use std::sync::Arc;
use std::time::Duration;

/// SHAH/USD price oracle
///
/// # Example
/// ```no_run
/// use shah_price_sdk::{OracleConfig, PriceOracle};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let oracle = PriceOracle::new(OracleConfig::from_env()?)?;
/// let price = oracle.get_price(false).await;
/// println!("SHAH: ${:.6}", price);
/// # Ok(())
/// # }
/// ```
pub struct PriceOracle {
    config: OracleConfig,
    resolver: Arc<PriceResolver>,
    poller: Poller,
}

impl PriceOracle {
    /// Creates an oracle with the standard sources:
    /// ShahSwap DEX, CoinGecko, CoinMarketCap and the custom API, in that
    /// priority order
    pub fn new(config: OracleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = SourceRegistry::from_config(&config)?;
        Ok(Self::build(config, registry))
    }

    /// Creates an oracle from `OracleConfig::from_env`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(OracleConfig::from_env()?)
    }

    /// Creates an oracle over custom sources
    ///
    /// Sources are tried in the registry's order; the cache, fallback and
    /// timeout settings come from `config`.
    pub fn with_registry(
        config: OracleConfig,
        registry: SourceRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, registry))
    }

    fn build(config: OracleConfig, registry: SourceRegistry) -> Self {
        tracing::debug!(sources = ?registry.source_names(), "Creating SHAH price oracle");
        let resolver = Arc::new(PriceResolver::new(registry, &config));
        Self {
            config,
            resolver,
            poller: Poller::new(),
        }
    }

    /// Gets the current SHAH price in USD
    ///
    /// Never fails. The value is fresh, the last cached price when every
    /// source is down, or the configured fallback when nothing has ever been
    /// resolved. Check `get_cache_info().is_stale` to tell them apart.
    pub async fn get_price(&self, force_refresh: bool) -> f64 {
        self.resolver.resolve_price(force_refresh).await
    }

    /// Registers a callback invoked with every newly resolved price
    ///
    /// Each call creates a separate registration. Callbacks run on the task
    /// that performed the resolution and should not block.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.resolver.subscribe(Arc::new(callback))
    }

    /// Removes a registration. Safe to call repeatedly; returns false when
    /// the registration was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.resolver.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.resolver.subscriber_count()
    }

    /// Starts refreshing the price every `interval`
    ///
    /// No-op if polling is already running. Must be called from within a
    /// tokio runtime.
    pub fn start_polling(&self, interval: Duration) -> bool {
        self.poller.start(self.resolver.clone(), interval)
    }

    /// Starts polling at the default 30 second interval
    pub fn start_default_polling(&self) -> bool {
        self.start_polling(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Stops polling. Safe to call when not running.
    pub fn stop_polling(&self) -> bool {
        self.poller.stop()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Reports the cached price, its source and staleness
    pub fn get_cache_info(&self) -> CacheInfo {
        self.resolver.cache_info()
    }

    /// Source names in priority order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.resolver.registry().source_names()
    }

    /// Fetch metrics per source, in priority order
    pub async fn get_source_metrics(&self) -> Vec<SourceMetrics> {
        self.resolver.source_metrics().await
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Perform a health check on the price oracle
    ///
    /// # Returns
    /// `Unhealthy` before any price has been resolved, `Degraded` while the
    /// cached price is stale, `Healthy` otherwise
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();
        let info = self.get_cache_info();

        details.insert("price".to_string(), serde_json::json!(info.price));
        details.insert("source".to_string(), serde_json::json!(info.source));
        details.insert("is_stale".to_string(), serde_json::json!(info.is_stale));
        details.insert(
            "time_until_stale_ms".to_string(),
            serde_json::json!(info.time_until_stale.as_millis() as u64),
        );
        details.insert(
            "subscribers".to_string(),
            serde_json::json!(self.subscriber_count()),
        );
        details.insert("polling".to_string(), serde_json::json!(self.is_polling()));

        let source_health: serde_json::Map<String, serde_json::Value> = self
            .get_source_metrics()
            .await
            .into_iter()
            .map(|m| {
                (
                    m.source_name.clone(),
                    serde_json::json!({
                        "success_rate": m.success_rate,
                        "total_requests": m.total_requests,
                        "latency_p50_ms": m.latency_p50_ms,
                        "last_error": m.last_error,
                    }),
                )
            })
            .collect();
        details.insert(
            "sources".to_string(),
            serde_json::Value::Object(source_health),
        );

        let status = match (info.price, info.is_stale) {
            (None, _) => HealthStatus::Unhealthy,
            (Some(_), true) => HealthStatus::Degraded,
            (Some(_), false) => HealthStatus::Healthy,
        };

        let message = match status {
            HealthStatus::Healthy => "Price oracle is operational with fresh data".to_string(),
            HealthStatus::Degraded => format!(
                "Price oracle is serving a stale price from {}",
                info.source.as_deref().unwrap_or("unknown")
            ),
            HealthStatus::Unhealthy => {
                "Price oracle has not resolved a price yet".to_string()
            }
        };

        ComponentHealth {
            name: "shah_price_oracle".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}

impl std::fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceOracle")
            .field("config", &self.config)
            .field("sources", &self.source_names())
            .field("polling", &self.is_polling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{mock::MockSource, PriceSource};
    use std::sync::Mutex;

    fn oracle_with(sources: &[Arc<MockSource>]) -> PriceOracle {
        let registry = SourceRegistry::new(
            sources
                .iter()
                .map(|s| s.clone() as Arc<dyn PriceSource>)
                .collect(),
        );
        PriceOracle::with_registry(OracleConfig::default(), registry).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = OracleConfig::default().with_fallback_price(0.0);
        assert!(matches!(
            PriceOracle::new(config),
            Err(ConfigError::InvalidFallbackPrice(_))
        ));
    }

    #[test]
    fn test_new_registers_standard_sources() {
        let oracle = PriceOracle::new(OracleConfig::default()).unwrap();
        assert_eq!(
            oracle.source_names(),
            vec!["shahswap", "coingecko", "coinmarketcap", "custom_api"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_change_notifies_subscriber() {
        let source = Arc::new(MockSource::new("shahswap").with_price(0.001));
        let oracle = oracle_with(&[source.clone()]);
        assert_eq!(oracle.get_price(false).await, 0.001);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = oracle.subscribe(move |price| sink.lock().unwrap().push(price));
        assert_eq!(oracle.subscriber_count(), 1);

        source.set_price(0.0025);
        assert_eq!(oracle.get_price(true).await, 0.0025);
        assert_eq!(*seen.lock().unwrap(), vec![0.0025]);

        assert!(oracle.unsubscribe(id));
        source.set_price(0.003);
        oracle.get_price(true).await;
        assert_eq!(*seen.lock().unwrap(), vec![0.0025]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_notifies_subscribers() {
        let source = Arc::new(MockSource::new("coingecko").with_price(0.002));
        let oracle = oracle_with(&[source.clone()]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        oracle.subscribe(move |price| sink.lock().unwrap().push(price));

        assert!(oracle.start_polling(Duration::from_secs(30)));
        assert!(!oracle.start_default_polling());
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert!(oracle.stop_polling());

        assert_eq!(*seen.lock().unwrap(), vec![0.002, 0.002]);
        assert!(!oracle.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_oracle_stops_polling() {
        let source = Arc::new(MockSource::new("shahswap").with_price(0.002));
        let oracle = oracle_with(&[source.clone()]);
        oracle.start_polling(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(source.call_count(), 1);

        drop(oracle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_tracks_cache_state() {
        let source = Arc::new(MockSource::new("shahswap"));
        let oracle = oracle_with(&[source.clone()]);

        let health = oracle.health_check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);

        source.set_price(0.002);
        oracle.get_price(false).await;
        let health = oracle.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["source"], serde_json::json!("shahswap"));
        assert_eq!(
            health.details["sources"]["shahswap"]["total_requests"],
            serde_json::json!(1)
        );

        tokio::time::advance(Duration::from_secs(31)).await;
        let health = oracle.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_info_after_resolution() {
        let source = Arc::new(MockSource::new("custom_api").with_price(0.004));
        let oracle = oracle_with(&[source]);

        assert_eq!(oracle.get_cache_info(), CacheInfo::empty());

        oracle.get_price(false).await;
        let info = oracle.get_cache_info();
        assert_eq!(info.price, Some(0.004));
        assert_eq!(info.source.as_deref(), Some("custom_api"));
        assert!(!info.is_stale);
        assert_eq!(info.time_until_stale, Duration::from_secs(30));
    }
}
