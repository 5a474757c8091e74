//! Per-source fetch metrics
//!
//! Tracks latency percentiles, success rate and the last failure for each
//! registered price source.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for a single source
#[derive(Debug, Clone)]
pub struct SourceMetrics {
    /// Name of the source
    pub source_name: String,
    /// 50th percentile latency of successful fetches in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful fetches in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate over the source lifetime (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches
    pub total_requests: u64,
    /// Number of failed fetches, timeouts included
    pub failed_requests: u64,
    /// Number of fetches cut off by the deadline
    pub timed_out_requests: u64,
    /// Most recent failure reason
    pub last_error: Option<String>,
}

impl SourceMetrics {
    /// Creates metrics with no data
    pub fn empty(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
            timed_out_requests: 0,
            last_error: None,
        }
    }
}

/// Outcome of one fetch, as seen by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Failure,
    Timeout,
}

#[derive(Debug, Default)]
struct Counters {
    /// Rolling window of successful fetch latencies
    latencies_ms: VecDeque<f64>,
    total: u64,
    failed: u64,
    timed_out: u64,
    last_error: Option<String>,
}

/// Collects metrics for one source
#[derive(Debug)]
pub struct MetricsCollector {
    source_name: String,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a source
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            counters: RwLock::new(Counters {
                latencies_ms: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records one fetch with its duration and outcome
    pub async fn record(&self, duration: Duration, outcome: FetchOutcome, error: Option<String>) {
        let mut counters = self.counters.write().await;
        counters.total += 1;

        match outcome {
            FetchOutcome::Success => {
                if counters.latencies_ms.len() >= MAX_SAMPLES {
                    counters.latencies_ms.pop_front();
                }
                counters
                    .latencies_ms
                    .push_back(duration.as_secs_f64() * 1000.0);
            }
            FetchOutcome::Failure | FetchOutcome::Timeout => {
                counters.failed += 1;
                if outcome == FetchOutcome::Timeout {
                    counters.timed_out += 1;
                }
                counters.last_error = error;
            }
        }
    }

    /// Computes current metrics
    pub async fn get_metrics(&self) -> SourceMetrics {
        let counters = self.counters.read().await;

        if counters.total == 0 {
            return SourceMetrics::empty(&self.source_name);
        }

        let mut latencies: Vec<f64> = counters.latencies_ms.iter().copied().collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        SourceMetrics {
            source_name: self.source_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate: (counters.total - counters.failed) as f64 / counters.total as f64,
            total_requests: counters.total,
            failed_requests: counters.failed,
            timed_out_requests: counters.timed_out,
            last_error: counters.last_error.clone(),
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
