use shah_price_sdk::{OracleConfig, PriceOracle};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the oracle from SHAH_* / COINGECKO_* / COINMARKETCAP_* env vars
    let oracle = PriceOracle::new(OracleConfig::from_env()?)?;

    println!(
        "Benchmarking SHAH Price SDK (sources: {})...",
        oracle.source_names().join(" > ")
    );
    println!("-------------------------------------------");

    // 2. Forced resolution: fans out to every source
    println!("1. Resolving from external sources...");
    let start_api = Instant::now();
    let price = oracle.get_price(true).await;
    let api_latency = start_api.elapsed();

    let info = oracle.get_cache_info();
    println!("   Price:  ${:.6}", price);
    match info.source {
        Some(source) => println!("   Source: {}", source),
        None => println!("   Source: none (all sources failed, fallback price)"),
    }
    println!("   Resolution latency: {:?}", api_latency);

    for metrics in oracle.get_source_metrics().await {
        println!(
            "   - {:<14} ok={:<5} last_error={}",
            metrics.source_name,
            metrics.failed_requests == 0,
            metrics.last_error.as_deref().unwrap_or("-")
        );
    }
    println!();

    // 3. Cache hits
    println!("2. Benchmarking cache hits...");
    let iterations: u32 = 10_000;
    let start_bench = Instant::now();
    for _ in 0..iterations {
        let _ = oracle.get_price(false).await;
    }
    let avg_cache_latency = start_bench.elapsed() / iterations;
    println!("   Average cached get_price: {:?}", avg_cache_latency);
    println!();

    println!("-------------------------------------------");
    println!("$9.99 = {} satoshis", oracle.usd_to_satoshis(9.99).await);
    println!("1 SHAH = ${:.6}", oracle.shah_to_usd(1.0).await);

    if avg_cache_latency.as_nanos() > 0 {
        let speedup = api_latency.as_secs_f64() / avg_cache_latency.as_secs_f64();
        println!("Cache is approx. {:.0}x faster than a resolution.", speedup);
    }

    Ok(())
}
