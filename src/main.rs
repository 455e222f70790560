//! Memo Cache - benchmark driver
//!
//! Exercises the cache with a simulated expensive computation and reports
//! per-scenario timings and the final counters.

use std::env;
use std::hint::black_box;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::{CacheConfig, CacheStats, MemoCache, NoStats, StatsRecorder};

/// Capacity used when `MEMO_MAX_ENTRIES` is unset
const BENCH_MAX_ENTRIES: usize = 4;

/// Simulated cost of one computation
const WORK: Duration = Duration::from_micros(500);

fn slow_double(x: i32) -> i32 {
    sleep(WORK);
    x * 2
}

fn slow_double_f64(x: i32) -> f64 {
    sleep(WORK);
    f64::from(x * 2)
}

/// Main entry point for the benchmark driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache with or without counters
/// 4. Run every scenario and print the counters as JSON
fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = bench_config();
    info!(
        "Configuration loaded: max_entries={}, eviction_fraction={}, max_eviction_batch={}, collect_stats={}",
        config.max_entries, config.eviction_fraction, config.max_eviction_batch, config.collect_stats
    );

    if config.collect_stats {
        run(MemoCache::<CacheStats>::with_config(&config)?)
    } else {
        run(MemoCache::<NoStats>::with_config(&config)?)
    }
}

/// Loads the environment config, defaulting to a small cache so the LRU
/// scenario evicts after a handful of calls.
fn bench_config() -> CacheConfig {
    let mut config = CacheConfig::from_env();
    if env::var_os("MEMO_MAX_ENTRIES").is_none() {
        config.max_entries = BENCH_MAX_ENTRIES;
    }
    config
}

fn run<S: StatsRecorder>(cache: MemoCache<S>) -> Result<()> {
    cold_then_hot(&cache)?;
    expire(&cache)?;
    lru_reinsert(&cache)?;
    type_mismatch(&cache)?;
    hash_collision(&cache)?;
    hot_loop(&cache, 100);
    cold_loop(&cache, 100);
    info!("All correctness checks passed");

    println!("{}", serde_json::to_string_pretty(&cache.stats())?);
    Ok(())
}

fn timed<T>(op: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = op();
    (value, start.elapsed())
}

fn cold_then_hot<S: StatsRecorder>(cache: &MemoCache<S>) -> Result<()> {
    let (cold, cold_time) = timed(|| cache.call(slow_double, 42));
    let (hot, hot_time) = timed(|| cache.call(slow_double, 42));
    ensure!(cold == 84 && hot == 84, "unexpected results {} / {}", cold, hot);
    info!("Cold (miss) time: {:?}", cold_time);
    info!("Hot  (hit)  time: {:?}", hot_time);
    Ok(())
}

fn expire<S: StatsRecorder>(cache: &MemoCache<S>) -> Result<()> {
    let ttl = Duration::from_millis(100);
    cache.call_with_ttl(ttl, slow_double_f64, 7);
    sleep(Duration::from_millis(150));

    // Expiry is lazy: an insertion elsewhere purges the stale entry first
    cache.call(slow_double, 8);
    let (result, elapsed) = timed(|| cache.call_with_ttl(ttl, slow_double_f64, 7));
    ensure!(result == 14.0, "unexpected result {}", result);
    info!("Expire + miss time: {:?}", elapsed);
    Ok(())
}

fn lru_reinsert<S: StatsRecorder>(cache: &MemoCache<S>) -> Result<()> {
    for x in 1..=cache.max_entries() as i32 + 1 {
        cache.call(slow_double, x);
    }
    let (result, elapsed) = timed(|| cache.call(slow_double, 1));
    ensure!(result == 2, "unexpected result {}", result);
    info!("LRU reinsert time: {:?}", elapsed);
    Ok(())
}

fn type_mismatch<S: StatsRecorder>(cache: &MemoCache<S>) -> Result<()> {
    let as_int = cache.call(slow_double, 99);
    let (as_double, elapsed) = timed(|| cache.call(slow_double_f64, 99));
    ensure!(as_int == 198, "unexpected int result {}", as_int);
    ensure!(as_double == 198.0, "unexpected double result {}", as_double);
    info!("Type mismatch time: {:?}", elapsed);
    Ok(())
}

fn hash_collision<S: StatsRecorder>(cache: &MemoCache<S>) -> Result<()> {
    let as_int = cache.call(slow_double, 10);
    let as_double = cache.call(slow_double_f64, 10);
    ensure!(as_int == 20, "unexpected int result {}", as_int);
    ensure!(as_double == 20.0, "unexpected double result {}", as_double);
    info!("Hash collision + type safety check passed");
    Ok(())
}

fn hot_loop<S: StatsRecorder>(cache: &MemoCache<S>, rounds: u32) {
    cache.call(slow_double, 42);
    let mut total = Duration::ZERO;
    let mut min = Duration::MAX;
    for _ in 0..rounds {
        let (value, elapsed) = timed(|| cache.call(slow_double, 42));
        black_box(value);
        total += elapsed;
        min = min.min(elapsed);
    }
    info!("Hot  loop: N={}, avg={:?}, min={:?}", rounds, total / rounds, min);
}

fn cold_loop<S: StatsRecorder>(cache: &MemoCache<S>, rounds: u32) {
    let mut total = Duration::ZERO;
    let mut min = Duration::MAX;
    for i in 0..rounds {
        // A fresh argument every round forces a miss
        let (value, elapsed) = timed(|| cache.call(slow_double, 1_000_000 + i as i32));
        black_box(value);
        total += elapsed;
        min = min.min(elapsed);
    }
    info!("Cold loop: N={}, avg={:?}, min={:?}", rounds, total / rounds, min);
}
