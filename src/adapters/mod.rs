//! Store measurement adapters
//!
//! Each adapter wraps a [`ReadingStore`] and measures one aspect of it.
//! Targets are collected by [`all_targets`] and driven by
//! [`run_all_benchmarks`](crate::benchmarks::run_all_benchmarks).
//!
//! # Available Targets
//!
//! - `InsertionLatencyTarget`: per-insert latency distribution
//! - `QueryPerformanceTarget`: timing of the common read queries
//! - `ThroughputTarget`: sustained inserts per second over a fixed window
//! - `BatchUploadTarget`: sequential batch upload with larger-batch projections

mod targets;

pub use targets::*;

use std::sync::Arc;
use std::time::Duration;

use crate::benchmarks::BenchmarkResult;
use crate::config::BenchmarksConfig;
use crate::state::ReadingStore;
use async_trait::async_trait;

/// A measurable operation against a store.
///
/// # Example
///
/// ```rust,ignore
/// use iot_sensor_analytics::adapters::BenchTarget;
/// use iot_sensor_analytics::benchmarks::BenchmarkResult;
/// use async_trait::async_trait;
///
/// struct PingTarget;
///
/// #[async_trait]
/// impl BenchTarget for PingTarget {
///     fn id(&self) -> String {
///         "ping".to_string()
///     }
///
///     async fn run(&self) -> BenchmarkResult {
///         BenchmarkResult::new(self.id(), serde_json::json!({"duration_ms": 0.4}))
///     }
/// }
/// ```
#[async_trait]
pub trait BenchTarget: Send + Sync {
    /// Stable kebab-case identifier, unique among registered targets
    fn id(&self) -> String;

    /// Execute the measurement. Failures are reported through an `error` metric.
    async fn run(&self) -> BenchmarkResult;
}

/// Every target, sized from the benchmark configuration.
///
/// Query performance runs after the insert-heavy targets so it sees a populated store.
pub fn all_targets(store: Arc<dyn ReadingStore>, config: &BenchmarksConfig) -> Vec<Box<dyn BenchTarget>> {
    vec![
        Box::new(InsertionLatencyTarget::new(store.clone()).with_inserts(config.insert_count)),
        Box::new(
            ThroughputTarget::new(store.clone())
                .with_duration(Duration::from_secs(config.throughput_secs)),
        ),
        Box::new(BatchUploadTarget::new(store.clone()).with_batch_size(config.batch_size)),
        Box::new(QueryPerformanceTarget::new(store)),
    ]
}
