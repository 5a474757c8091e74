//! SHAH/USD unit conversions
//!
//! The `*_at` functions are pure arithmetic against an explicit price. The
//! `PriceOracle` methods resolve the price first (cache-aware, never
//! failing) and then apply the same arithmetic.

use crate::{constants::SATOSHIS_PER_SHAH, oracle::PriceOracle};

/// SHAH amount to USD at `price` USD per SHAH
pub fn shah_to_usd_at(shah_amount: f64, price: f64) -> f64 {
    shah_amount * price
}

/// USD amount to SHAH at `price` USD per SHAH
pub fn usd_to_shah_at(usd_amount: f64, price: f64) -> f64 {
    usd_amount / price
}

/// Satoshi amount to USD at `price` USD per SHAH
pub fn satoshis_to_usd_at(satoshis: i64, price: f64) -> f64 {
    shah_to_usd_at(satoshis as f64 / SATOSHIS_PER_SHAH, price)
}

/// USD amount to whole satoshis at `price` USD per SHAH, rounding half away
/// from zero. Saturates at the `i64` bounds.
pub fn usd_to_satoshis_at(usd_amount: f64, price: f64) -> i64 {
    (usd_to_shah_at(usd_amount, price) * SATOSHIS_PER_SHAH).round() as i64
}

impl PriceOracle {
    /// Converts SHAH to USD at the current price
    pub async fn shah_to_usd(&self, shah_amount: f64) -> f64 {
        shah_to_usd_at(shah_amount, self.get_price(false).await)
    }

    /// Converts USD to SHAH at the current price
    pub async fn usd_to_shah(&self, usd_amount: f64) -> f64 {
        usd_to_shah_at(usd_amount, self.get_price(false).await)
    }

    /// Converts satoshis to USD at the current price
    pub async fn satoshis_to_usd(&self, satoshis: i64) -> f64 {
        satoshis_to_usd_at(satoshis, self.get_price(false).await)
    }

    /// Converts USD to whole satoshis at the current price
    pub async fn usd_to_satoshis(&self, usd_amount: f64) -> i64 {
        usd_to_satoshis_at(usd_amount, self.get_price(false).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleConfig;
    use crate::provider::{mock::MockSource, PriceSource};
    use crate::registry::SourceRegistry;
    use std::sync::Arc;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_pure_conversions() {
        assert_close(shah_to_usd_at(1_000.0, 0.002), 2.0);
        assert_close(usd_to_shah_at(2.0, 0.002), 1_000.0);
        assert_close(satoshis_to_usd_at(100_000_000, 0.002), 0.002);
        assert_eq!(usd_to_satoshis_at(0.002, 0.002), 100_000_000);
    }

    #[test]
    fn test_usd_to_satoshis_rounds_to_nearest() {
        // 0.4 and 0.6 satoshi
        assert_eq!(usd_to_satoshis_at(0.4e-8, 1.0), 0);
        assert_eq!(usd_to_satoshis_at(0.6e-8, 1.0), 1);
        assert_eq!(usd_to_satoshis_at(-0.6e-8, 1.0), -1);
        assert_eq!(usd_to_satoshis_at(0.0, 0.002), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_round_trip() {
        let source = Arc::new(MockSource::new("shahswap").with_price(0.002));
        let registry = SourceRegistry::new(vec![source.clone() as Arc<dyn PriceSource>]);
        let oracle = PriceOracle::with_registry(OracleConfig::default(), registry).unwrap();

        let usd = oracle.satoshis_to_usd(50_000_000).await;
        assert_close(usd, 0.001);
        let satoshis = oracle.usd_to_satoshis(usd).await;
        assert!((satoshis - 50_000_000).abs() <= 1);

        assert_close(oracle.shah_to_usd(10.0).await, 0.02);
        assert_close(oracle.usd_to_shah(1.0).await, 500.0);

        // All four conversions shared one resolution
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conversions_use_fallback_when_sources_fail() {
        let source = Arc::new(MockSource::new("shahswap").with_error("down"));
        let registry = SourceRegistry::new(vec![source as Arc<dyn PriceSource>]);
        let oracle = PriceOracle::with_registry(OracleConfig::default(), registry).unwrap();

        assert_close(oracle.usd_to_shah(1.0).await, 1_000.0);
        assert_eq!(oracle.usd_to_satoshis(0.001).await, 100_000_000);
    }
}
