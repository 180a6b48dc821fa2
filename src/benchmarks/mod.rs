//! Store performance measurement
//!
//! - `BenchmarkResult`: target id, free-form metrics and timestamp
//! - `BenchTarget` (in the adapters module): one measurable operation
//! - `run_all_benchmarks()`: drives every registered target against a store
//!
//! # Usage
//!
//! ```rust,ignore
//! use iot_sensor_analytics::benchmarks;
//! use iot_sensor_analytics::config::BenchmarksConfig;
//! use iot_sensor_analytics::state::create_in_memory_store;
//!
//! let config = BenchmarksConfig::default();
//! let results = benchmarks::run_and_save_benchmarks(create_in_memory_store(), &config).await?;
//! ```

pub mod io;
pub mod result;

pub use result::{BenchmarkResult, BenchmarkResultBuilder, LatencyStats};

use std::sync::Arc;
use std::time::Instant;

use crate::adapters::all_targets;
use crate::config::BenchmarksConfig;
use crate::state::ReadingStore;

/// Run every registered target against `store`, in registration order
pub async fn run_all_benchmarks(
    store: Arc<dyn ReadingStore>,
    config: &BenchmarksConfig,
) -> Vec<BenchmarkResult> {
    let targets = all_targets(store, config);
    let mut results = Vec::with_capacity(targets.len());

    tracing::info!(targets = targets.len(), "Running benchmark targets");

    for target in targets {
        let id = target.id();
        let start = Instant::now();
        let result = target.run().await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        if result.is_success() {
            tracing::info!(target = %id, elapsed_ms, "Benchmark completed");
        } else {
            tracing::warn!(
                target = %id,
                elapsed_ms,
                error = ?result.metrics.get("error"),
                "Benchmark failed"
            );
        }

        results.push(result);
    }

    let successful = results.iter().filter(|r| r.is_success()).count();
    tracing::info!(
        successful,
        failed = results.len() - successful,
        "Benchmarks finished"
    );

    results
}

/// Run every target and write the results under `config.output_dir`
pub async fn run_and_save_benchmarks(
    store: Arc<dyn ReadingStore>,
    config: &BenchmarksConfig,
) -> std::io::Result<Vec<BenchmarkResult>> {
    let results = run_all_benchmarks(store, config).await;
    io::save_results(&results, &config.output_dir)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InMemoryStore;

    fn quick_config(output_dir: std::path::PathBuf) -> BenchmarksConfig {
        BenchmarksConfig {
            insert_count: 10,
            throughput_secs: 0,
            batch_size: 10,
            output_dir,
        }
    }

    #[tokio::test]
    async fn test_run_all_benchmarks() {
        let config = quick_config("unused".into());
        let results = run_all_benchmarks(Arc::new(InMemoryStore::new()), &config).await;

        let ids: Vec<_> = results.iter().map(|r| r.target_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["insertion-latency", "throughput", "batch-upload", "query-performance"]
        );
        // Query performance sees the documents inserted by the earlier targets
        assert!(results[3].is_success());
    }

    #[tokio::test]
    async fn test_run_and_save_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path().to_path_buf());

        let results = run_and_save_benchmarks(Arc::new(InMemoryStore::new()), &config)
            .await
            .unwrap();

        let raw = io::read_all_results_from_dir(dir.path().join(io::RAW_SUBDIR)).unwrap();
        assert_eq!(raw.len(), results.len());
    }
}
