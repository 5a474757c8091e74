//! Types for the SHAH price oracle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of the price cache, as returned by `PriceOracle::get_cache_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Last resolved price in USD per SHAH
    pub price: Option<f64>,

    /// When `price` was resolved
    pub timestamp: Option<DateTime<Utc>>,

    /// Source that produced `price`
    pub source: Option<String>,

    /// True when the cache is empty or older than the cache duration
    pub is_stale: bool,

    /// Time left before the cached price goes stale (zero when stale)
    pub time_until_stale: Duration,
}

impl CacheInfo {
    /// Cache info for an oracle that has never resolved a price
    pub fn empty() -> Self {
        Self {
            price: None,
            timestamp: None,
            source: None,
            is_stale: true,
            time_until_stale: Duration::ZERO,
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// System is healthy and all components are operational
    Healthy,
    /// System is degraded but still functional
    Degraded,
    /// System is unhealthy and requires attention
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
