//! Price resolution: cache check, concurrent fan-out to every source,
//! priority selection and subscriber notification.

use crate::{
    config::OracleConfig,
    error::ProviderError,
    metrics::{FetchOutcome, MetricsCollector, SourceMetrics},
    provider::PriceSource,
    registry::SourceRegistry,
    store::PriceCache,
    subscription::{notify_all, PriceCallback, SubscriptionHub, SubscriptionId},
    types::CacheInfo,
};
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{timeout, Instant};

/// Shared mutable state. Cache and subscribers sit behind one lock.
#[derive(Default)]
struct OracleState {
    cache: PriceCache,
    subscribers: SubscriptionHub,
}

/// Resolves the SHAH/USD price from the cache or the registered sources
///
/// At most one fan-out runs at a time. `resolve_price` never fails: it
/// returns a fresh price, the last cached price, or the configured fallback.
pub struct PriceResolver {
    registry: SourceRegistry,
    metrics: Vec<Arc<MetricsCollector>>,
    state: Mutex<OracleState>,
    refresh_gate: tokio::sync::Mutex<()>,
    cache_duration: Duration,
    fallback_price: f64,
    request_timeout: Duration,
}

impl PriceResolver {
    /// Creates a resolver over `registry` using the cache, fallback and
    /// timeout settings from `config`
    pub fn new(registry: SourceRegistry, config: &OracleConfig) -> Self {
        let metrics = registry
            .sources()
            .iter()
            .map(|s| Arc::new(MetricsCollector::new(s.source_name())))
            .collect();

        Self {
            registry,
            metrics,
            state: Mutex::new(OracleState::default()),
            refresh_gate: tokio::sync::Mutex::new(()),
            cache_duration: config.cache_duration,
            fallback_price: config.fallback_price,
            request_timeout: config.request_timeout,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OracleState> {
        // Callbacks never run under this lock, so a poisoned guard still
        // holds a consistent cache.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_cached_price(&self) -> Option<f64> {
        self.lock_state().cache.fresh_price(self.cache_duration)
    }

    /// Returns the current price
    ///
    /// Without `force_refresh`, a cached price younger than the cache
    /// duration is returned with no network activity. Otherwise all sources
    /// are queried concurrently. Callers arriving while a refresh is in
    /// flight wait for it; non-forced callers then reuse its result.
    pub async fn resolve_price(&self, force_refresh: bool) -> f64 {
        if !force_refresh {
            if let Some(price) = self.fresh_cached_price() {
                return price;
            }
        }

        let _gate = self.refresh_gate.lock().await;

        if !force_refresh {
            if let Some(price) = self.fresh_cached_price() {
                return price;
            }
        }

        self.refresh_locked().await
    }

    /// Runs a forced refresh unless one is already in flight
    ///
    /// Returns `None` without touching any source when another refresh
    /// holds the gate.
    pub async fn try_refresh(&self) -> Option<f64> {
        let _gate = self.refresh_gate.try_lock().ok()?;
        Some(self.refresh_locked().await)
    }

    /// Fan-out, selection and cache update. Caller holds the refresh gate.
    async fn refresh_locked(&self) -> f64 {
        let results = self.fan_out().await;

        // Registry order, not completion order
        let winner = results
            .iter()
            .find_map(|(name, result)| result.as_ref().ok().map(|price| (*name, *price)));

        if let Some((source, price)) = winner {
            let subscribers = {
                let mut state = self.lock_state();
                state.cache.update(price, source);
                state.subscribers.snapshot()
            };

            tracing::debug!(
                source,
                price,
                subscribers = subscribers.len(),
                "Resolved SHAH price"
            );
            notify_all(&subscribers, price);
            return price;
        }

        let cached = self
            .lock_state()
            .cache
            .get()
            .map(|entry| (entry.price, entry.source.clone(), entry.age()));

        match cached {
            Some((price, source, age)) => {
                tracing::warn!(
                    sources = results.len(),
                    price,
                    source = %source,
                    age_secs = age.as_secs(),
                    "All price sources failed, serving cached price"
                );
                price
            }
            None => {
                tracing::warn!(
                    sources = results.len(),
                    fallback_price = self.fallback_price,
                    "All price sources failed and nothing is cached, serving fallback price"
                );
                self.fallback_price
            }
        }
    }

    /// Queries every source concurrently and waits for all of them
    ///
    /// Results come back in registry order. Each fetch is dropped (and its
    /// request cancelled) once the request timeout elapses.
    async fn fan_out(&self) -> Vec<(&'static str, Result<f64, ProviderError>)> {
        let fetches = self
            .registry
            .sources()
            .iter()
            .zip(&self.metrics)
            .map(|(source, metrics)| self.fetch_one(source, metrics));

        join_all(fetches).await
    }

    async fn fetch_one(
        &self,
        source: &Arc<dyn PriceSource>,
        metrics: &MetricsCollector,
    ) -> (&'static str, Result<f64, ProviderError>) {
        let name = source.source_name();
        let start = Instant::now();

        let result = match timeout(self.request_timeout, source.fetch_price()).await {
            Ok(Ok(price)) if price.is_finite() && price > 0.0 => Ok(price),
            Ok(Ok(price)) => Err(ProviderError::InvalidPrice(price)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout),
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(price) => {
                tracing::debug!(
                    source = name,
                    price,
                    latency_ms = elapsed.as_millis() as u64,
                    "Fetched price"
                );
                metrics.record(elapsed, FetchOutcome::Success, None).await;
            }
            Err(e) => {
                tracing::warn!(
                    source = name,
                    error = %e,
                    latency_ms = elapsed.as_millis() as u64,
                    "Price source failed"
                );
                let outcome = if e.is_timeout() {
                    FetchOutcome::Timeout
                } else {
                    FetchOutcome::Failure
                };
                metrics.record(elapsed, outcome, Some(e.to_string())).await;
            }
        }

        (name, result)
    }

    /// Registers a callback for newly resolved prices
    pub fn subscribe(&self, callback: PriceCallback) -> SubscriptionId {
        self.lock_state().subscribers.subscribe(callback)
    }

    /// Removes a registration; false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_state().subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_state().subscribers.len()
    }

    /// Reports cached price, source and staleness
    pub fn cache_info(&self) -> CacheInfo {
        self.lock_state().cache.info(self.cache_duration)
    }

    pub fn cache_duration(&self) -> Duration {
        self.cache_duration
    }

    pub fn fallback_price(&self) -> f64 {
        self.fallback_price
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetch metrics per source, in registry order
    pub async fn source_metrics(&self) -> Vec<SourceMetrics> {
        let mut all = Vec::with_capacity(self.metrics.len());
        for collector in &self.metrics {
            all.push(collector.get_metrics().await);
        }
        all
    }
}
