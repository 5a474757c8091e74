//! In-memory price cache

use crate::types::CacheInfo;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// A resolved price together with when and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPrice {
    /// Price in USD per SHAH, always strictly positive
    pub price: f64,

    /// Monotonic resolution time, used for staleness
    pub fetched_at: Instant,

    /// Wall-clock resolution time, used for reporting
    pub updated_at: DateTime<Utc>,

    /// Name of the source that produced the price
    pub source: String,
}

impl CachedPrice {
    /// Creates an entry stamped with the current time
    pub fn new(price: f64, source: impl Into<String>) -> Self {
        Self {
            price,
            fetched_at: Instant::now(),
            updated_at: Utc::now(),
            source: source.into(),
        }
    }

    /// Age of the entry
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// True once the entry is at least `max_age` old
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }
}

/// Last known-good price
///
/// Price, timestamp and source are held in one `Option`, so they are present
/// or absent together. The cache is overwritten on every successful
/// resolution and never cleared; a stale value is still served.
#[derive(Debug, Default)]
pub struct PriceCache {
    entry: Option<CachedPrice>,
}

impl PriceCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Stores a freshly resolved price
    ///
    /// Non-positive or non-finite prices are ignored.
    pub fn update(&mut self, price: f64, source: impl Into<String>) -> bool {
        if !price.is_finite() || price <= 0.0 {
            tracing::warn!(price, "Refusing to cache non-positive price");
            return false;
        }
        let entry = CachedPrice::new(price, source);
        tracing::debug!(price = entry.price, source = %entry.source, "Updated cached price");
        self.entry = Some(entry);
        true
    }

    /// Returns the cached entry regardless of staleness
    pub fn get(&self) -> Option<&CachedPrice> {
        self.entry.as_ref()
    }

    /// Returns the cached price only while it is younger than `max_age`
    pub fn fresh_price(&self, max_age: Duration) -> Option<f64> {
        self.entry
            .as_ref()
            .filter(|entry| !entry.is_stale(max_age))
            .map(|entry| entry.price)
    }

    /// True if the cache is empty or older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.entry
            .as_ref()
            .map_or(true, |entry| entry.is_stale(max_age))
    }

    /// Reports the cache contents and staleness
    pub fn info(&self, max_age: Duration) -> CacheInfo {
        match &self.entry {
            Some(entry) => {
                let age = entry.age();
                CacheInfo {
                    price: Some(entry.price),
                    timestamp: Some(entry.updated_at),
                    source: Some(entry.source.clone()),
                    is_stale: age >= max_age,
                    time_until_stale: max_age.saturating_sub(age),
                }
            }
            None => CacheInfo::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_stale() {
        let mut cache = PriceCache::new();
        assert!(cache.is_stale(WINDOW));
        assert_eq!(cache.fresh_price(WINDOW), None);

        assert!(cache.update(0.0021, "coingecko"));
        assert_eq!(cache.fresh_price(WINDOW), Some(0.0021));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!cache.is_stale(WINDOW));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.is_stale(WINDOW));
        assert_eq!(cache.fresh_price(WINDOW), None);
        // Stale entries are kept
        assert_eq!(cache.get().map(|e| e.price), Some(0.0021));
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_reports_time_until_stale() {
        let mut cache = PriceCache::new();
        assert_eq!(cache.info(WINDOW), CacheInfo::empty());

        cache.update(0.002, "shahswap");
        tokio::time::advance(Duration::from_secs(10)).await;

        let info = cache.info(WINDOW);
        assert_eq!(info.price, Some(0.002));
        assert_eq!(info.source.as_deref(), Some("shahswap"));
        assert!(info.timestamp.is_some());
        assert!(!info.is_stale);
        assert_eq!(info.time_until_stale, Duration::from_secs(20));

        tokio::time::advance(Duration::from_secs(45)).await;
        let info = cache.info(WINDOW);
        assert!(info.is_stale);
        assert_eq!(info.time_until_stale, Duration::ZERO);
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let mut cache = PriceCache::new();
        assert!(!cache.update(0.0, "mock"));
        assert!(!cache.update(-1.0, "mock"));
        assert!(!cache.update(f64::NAN, "mock"));
        assert!(cache.get().is_none());
    }
}
