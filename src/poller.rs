//! Background polling task

use crate::{constants::MIN_POLL_INTERVAL_MS, resolver::PriceResolver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

struct PollTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Forces a refresh on a fixed interval
///
/// Ticks that land while another refresh is in flight are skipped, so the
/// poller never starts a second fan-out alongside a running one.
#[derive(Default)]
pub struct Poller {
    task: Mutex<Option<PollTask>>,
}

impl Poller {
    pub fn new() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<PollTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts polling. Returns false if already running or if called
    /// outside a tokio runtime.
    ///
    /// The first refresh happens one `interval` after start. Intervals
    /// shorter than one millisecond are raised to one millisecond.
    pub fn start(&self, resolver: Arc<PriceResolver>, interval: Duration) -> bool {
        let mut slot = self.lock_task();
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            tracing::debug!("Price polling already running");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot start price polling outside a tokio runtime");
                return false;
            }
        };

        let min = Duration::from_millis(MIN_POLL_INTERVAL_MS);
        if interval < min {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Poll interval too small, using minimum"
            );
        }
        let interval = interval.max(min);

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(poll_loop(resolver, interval, stop_rx));
        *slot = Some(PollTask { stop_tx, handle });

        tracing::info!(
            interval_ms = interval.as_millis() as u64,
            "Started SHAH price polling"
        );
        true
    }

    /// Stops polling. A refresh already in flight is allowed to finish.
    /// Returns false if polling was not running.
    pub fn stop(&self) -> bool {
        match self.lock_task().take() {
            Some(task) => {
                let _ = task.stop_tx.send(true);
                tracing::info!("Stopping SHAH price polling");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    resolver: Arc<PriceResolver>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if resolver.try_refresh().await.is_none() {
                    tracing::debug!("Refresh already in flight, skipping poll tick");
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Price polling task exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleConfig;
    use crate::provider::mock::{InFlightGauge, MockSource};
    use crate::registry::SourceRegistry;

    fn resolver_with(sources: Vec<Arc<MockSource>>) -> Arc<PriceResolver> {
        let registry = SourceRegistry::new(
            sources
                .into_iter()
                .map(|s| s as Arc<dyn crate::provider::PriceSource>)
                .collect(),
        );
        Arc::new(PriceResolver::new(registry, &OracleConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let source = Arc::new(MockSource::new("shahswap").with_price(0.002));
        let resolver = resolver_with(vec![source.clone()]);
        let poller = Poller::new();

        assert!(poller.start(resolver, Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(source.call_count(), 3);

        assert!(poller.stop());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.call_count(), 3);
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let resolver = resolver_with(vec![Arc::new(MockSource::new("shahswap"))]);
        let poller = Poller::new();

        assert!(!poller.stop());
        assert!(poller.start(resolver.clone(), Duration::from_secs(30)));
        assert!(!poller.start(resolver.clone(), Duration::from_secs(1)));
        assert!(poller.is_running());

        assert!(poller.stop());
        assert!(!poller.stop());

        assert!(poller.start(resolver, Duration::from_secs(30)));
        assert!(poller.is_running());
    }

    #[test]
    fn test_start_outside_runtime_is_refused() {
        let resolver = resolver_with(vec![Arc::new(MockSource::new("shahswap"))]);
        let poller = Poller::new();
        assert!(!poller.start(resolver, Duration::from_secs(1)));
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_ticks_never_overlap_fan_outs() {
        let gauge = InFlightGauge::new();
        let sources: Vec<Arc<MockSource>> = ["shahswap", "coingecko", "coinmarketcap", "custom_api"]
            .into_iter()
            .map(|name| {
                Arc::new(
                    MockSource::new(name)
                        .with_price(0.002)
                        .with_delay(Duration::from_millis(200))
                        .with_gauge(gauge.clone()),
                )
            })
            .collect();
        let resolver = resolver_with(sources.clone());
        let poller = Poller::new();

        assert!(poller.start(resolver.clone(), Duration::from_millis(10)));

        // Explicit forced refreshes race the poller
        let mut callers = Vec::new();
        for _ in 0..3 {
            let resolver = resolver.clone();
            callers.push(tokio::spawn(async move { resolver.resolve_price(true).await }));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        for caller in callers {
            assert_eq!(caller.await.unwrap(), 0.002);
        }
        poller.stop();

        assert!(gauge.peak() <= sources.len());
        assert!(sources[0].call_count() >= 2);
        // 200 ms per fan-out bounds the number of fan-outs in one second
        assert!(sources[0].call_count() <= 6);
    }
}
