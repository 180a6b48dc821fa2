//! Benchmark result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{Distribution, Percentiles};

/// Outcome of one measurement target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Identifier of the benchmark target
    pub target_id: String,

    /// Measurements, shaped per target
    pub metrics: serde_json::Value,

    /// When the benchmark was executed
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Create a new BenchmarkResult with the current timestamp
    pub fn new(target_id: impl Into<String>, metrics: serde_json::Value) -> Self {
        Self {
            target_id: target_id.into(),
            metrics,
            timestamp: Utc::now(),
        }
    }

    /// Check if this result indicates success (no error field in metrics)
    pub fn is_success(&self) -> bool {
        !self.metrics.get("error").is_some_and(|e| !e.is_null())
    }

    /// Get a specific metric value by key
    pub fn get_metric(&self, key: &str) -> Option<&serde_json::Value> {
        self.metrics.get(key)
    }

    /// Get duration in milliseconds if present
    pub fn duration_ms(&self) -> Option<f64> {
        self.metrics.get("duration_ms").and_then(|v| v.as_f64())
    }

    /// Get throughput if present
    pub fn throughput(&self) -> Option<f64> {
        self.metrics.get("throughput").and_then(|v| v.as_f64())
    }
}

/// Summary of a set of latency samples, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub median_ms: f64,
    /// Sample standard deviation, 0 for a single sample
    pub std_dev_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencyStats {
    /// `None` when there are no samples
    pub fn from_samples(samples_ms: &[f64]) -> Option<Self> {
        let distribution = Distribution::from_data(samples_ms).ok()?;
        let percentiles = Percentiles::from_data(samples_ms.to_vec());

        Some(Self {
            min_ms: distribution.min,
            max_ms: distribution.max,
            avg_ms: distribution.mean,
            median_ms: distribution.median,
            std_dev_ms: distribution.std_dev,
            p95_ms: percentiles.p95,
            p99_ms: percentiles.p99,
        })
    }
}

/// Builder for constructing BenchmarkResult with common metrics
#[derive(Debug, Default)]
pub struct BenchmarkResultBuilder {
    target_id: String,
    metrics: serde_json::Map<String, serde_json::Value>,
    timestamp: Option<DateTime<Utc>>,
}

impl BenchmarkResultBuilder {
    /// Create a new builder for the given target
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            metrics: serde_json::Map::new(),
            timestamp: None,
        }
    }

    /// Set the duration in milliseconds
    pub fn duration_ms(mut self, duration: f64) -> Self {
        self.metrics.insert("duration_ms".to_string(), serde_json::json!(duration));
        self
    }

    /// Set the throughput (operations per second)
    pub fn throughput(mut self, ops_per_sec: f64) -> Self {
        self.metrics.insert("throughput".to_string(), serde_json::json!(ops_per_sec));
        self
    }

    /// Record attempted, successful and failed operations plus the success rate in percent
    pub fn outcomes(mut self, attempted: u64, successful: u64) -> Self {
        let failed = attempted.saturating_sub(successful);
        let success_rate = if attempted > 0 {
            successful as f64 * 100.0 / attempted as f64
        } else {
            0.0
        };

        self.metrics.insert("total_operations".to_string(), serde_json::json!(attempted));
        self.metrics.insert("successful".to_string(), serde_json::json!(successful));
        self.metrics.insert("failed".to_string(), serde_json::json!(failed));
        self.metrics.insert("success_rate".to_string(), serde_json::json!(success_rate));
        self
    }

    /// Set every latency statistic
    pub fn latency(mut self, stats: &LatencyStats) -> Self {
        let fields = [
            ("min_latency_ms", stats.min_ms),
            ("max_latency_ms", stats.max_ms),
            ("mean_latency_ms", stats.avg_ms),
            ("median_latency_ms", stats.median_ms),
            ("std_deviation_ms", stats.std_dev_ms),
            ("p95_latency_ms", stats.p95_ms),
            ("p99_latency_ms", stats.p99_ms),
        ];
        for (key, value) in fields {
            self.metrics.insert(key.to_string(), serde_json::json!(value));
        }
        self
    }

    /// Set an error message
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.metrics.insert("error".to_string(), serde_json::json!(message.into()));
        self
    }

    /// Add a custom metric
    pub fn metric(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Set a specific timestamp
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Build the BenchmarkResult
    pub fn build(self) -> BenchmarkResult {
        BenchmarkResult {
            target_id: self.target_id,
            metrics: serde_json::Value::Object(self.metrics),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}
