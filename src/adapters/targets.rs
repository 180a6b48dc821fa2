//! Benchmark target implementations
//!
//! Each target drives a reading store through one measurement:
//! insertion latency, query timings, time-boxed throughput and batch upload.

use crate::adapters::BenchTarget;
use crate::analytics::temperature_by_type_pipeline;
use crate::benchmarks::{BenchmarkResult, BenchmarkResultBuilder, LatencyStats};
use crate::models::{Document, SensorKind};
use crate::simulator::ReadingGenerator;
use crate::state::{FindQuery, ReadingFilter, ReadingStore, SortSpec};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn generate_document(generator: &mut ReadingGenerator) -> Option<Document> {
    let reading = generator.generate(None);
    match reading.to_document() {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode generated reading");
            None
        }
    }
}

// ============================================================================
// Insertion Latency
// ============================================================================

/// Per-insert latency over a fixed number of single-document inserts
pub struct InsertionLatencyTarget {
    store: Arc<dyn ReadingStore>,
    inserts: usize,
}

impl InsertionLatencyTarget {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store, inserts: 100 }
    }

    pub fn with_inserts(mut self, inserts: usize) -> Self {
        self.inserts = inserts;
        self
    }
}

#[async_trait]
impl BenchTarget for InsertionLatencyTarget {
    fn id(&self) -> String {
        "insertion-latency".to_string()
    }

    async fn run(&self) -> BenchmarkResult {
        let mut generator = ReadingGenerator::new();
        let mut latencies = Vec::with_capacity(self.inserts);
        let start = Instant::now();

        for _ in 0..self.inserts {
            let Some(document) = generate_document(&mut generator) else {
                continue;
            };

            let insert_start = Instant::now();
            match self.store.insert(document).await {
                Ok(_) => latencies.push(elapsed_ms(insert_start)),
                Err(e) => tracing::debug!(error = %e, "Insert failed during latency run"),
            }
        }

        let builder = BenchmarkResultBuilder::new(self.id())
            .outcomes(self.inserts as u64, latencies.len() as u64)
            .duration_ms(elapsed_ms(start));

        match LatencyStats::from_samples(&latencies) {
            Some(stats) => builder.latency(&stats).build(),
            None => builder.error("no insert succeeded").build(),
        }
    }
}

// ============================================================================
// Query Performance
// ============================================================================

/// Execution time of the common read queries
pub struct QueryPerformanceTarget {
    store: Arc<dyn ReadingStore>,
}

impl QueryPerformanceTarget {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    fn timing<T>(start: Instant, outcome: crate::error::Result<T>, count: impl Fn(&T) -> u64) -> serde_json::Value {
        let execution_time_ms = elapsed_ms(start);
        match outcome {
            Ok(value) => json!({
                "execution_time_ms": execution_time_ms,
                "results_count": count(&value),
            }),
            Err(e) => json!({
                "execution_time_ms": 0.0,
                "results_count": 0,
                "error": e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl BenchTarget for QueryPerformanceTarget {
    fn id(&self) -> String {
        "query-performance".to_string()
    }

    async fn run(&self) -> BenchmarkResult {
        let builder = BenchmarkResultBuilder::new(self.id());

        match self.store.count(&ReadingFilter::all()).await {
            Ok(0) => return builder.error("store is empty, nothing to query").build(),
            Err(e) => return builder.error(e.to_string()).build(),
            Ok(_) => {}
        }

        let start = Instant::now();
        let last_10 = self
            .store
            .find(&FindQuery::all().sort_by(SortSpec::desc("timestamp")).limit(10))
            .await;
        let last_10 = Self::timing(start, last_10, |docs| docs.len() as u64);

        let start = Instant::now();
        let exterior = self
            .store
            .find(&FindQuery::new(ReadingFilter::all().with_kind(SensorKind::Exterior)))
            .await;
        let exterior = Self::timing(start, exterior, |docs| docs.len() as u64);

        let start = Instant::now();
        let by_type = self.store.aggregate(&temperature_by_type_pipeline()).await;
        let by_type = Self::timing(start, by_type, |rows| rows.len() as u64);

        let start = Instant::now();
        let total = self.store.count(&ReadingFilter::all()).await;
        let total = Self::timing(start, total, |count| *count);

        builder
            .metric("last_10_readings", last_10)
            .metric("filter_exterior", exterior)
            .metric("avg_temp_by_type", by_type)
            .metric("total_count", total)
            .build()
    }
}

// ============================================================================
// Throughput
// ============================================================================

/// Inserts per second sustained over a fixed duration
pub struct ThroughputTarget {
    store: Arc<dyn ReadingStore>,
    duration: Duration,
}

impl ThroughputTarget {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            duration: Duration::from_secs(10),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

#[async_trait]
impl BenchTarget for ThroughputTarget {
    fn id(&self) -> String {
        "throughput".to_string()
    }

    async fn run(&self) -> BenchmarkResult {
        let mut generator = ReadingGenerator::new();
        let mut inserted = 0u64;
        let mut attempted = 0u64;
        let start = Instant::now();

        while start.elapsed() < self.duration {
            attempted += 1;
            if let Some(document) = generate_document(&mut generator) {
                if self.store.insert(document).await.is_ok() {
                    inserted += 1;
                }
            }
            if attempted % 100 == 0 {
                tokio::task::yield_now().await;
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        let throughput = if elapsed > 0.0 { inserted as f64 / elapsed } else { 0.0 };

        BenchmarkResultBuilder::new(self.id())
            .duration_ms(elapsed * 1000.0)
            .throughput(throughput)
            .outcomes(attempted, inserted)
            .build()
    }
}

// ============================================================================
// Batch Upload
// ============================================================================

/// Sequential upload of a pre-generated batch, with projections for larger batches
pub struct BatchUploadTarget {
    store: Arc<dyn ReadingStore>,
    batch_size: usize,
}

impl BatchUploadTarget {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            batch_size: 100,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[async_trait]
impl BenchTarget for BatchUploadTarget {
    fn id(&self) -> String {
        "batch-upload".to_string()
    }

    async fn run(&self) -> BenchmarkResult {
        let mut generator = ReadingGenerator::new();
        let documents: Vec<Document> = (0..self.batch_size)
            .filter_map(|_| generate_document(&mut generator))
            .collect();

        let mut inserted = 0u64;
        let start = Instant::now();
        for document in documents {
            if self.store.insert(document).await.is_ok() {
                inserted += 1;
            }
        }
        let total_secs = start.elapsed().as_secs_f64();

        let avg_ms = if inserted > 0 {
            total_secs * 1000.0 / inserted as f64
        } else {
            0.0
        };
        let throughput = if total_secs > 0.0 { inserted as f64 / total_secs } else { 0.0 };

        let builder = BenchmarkResultBuilder::new(self.id())
            .duration_ms(total_secs * 1000.0)
            .throughput(throughput)
            .outcomes(self.batch_size as u64, inserted)
            .metric("avg_per_document_ms", json!(avg_ms))
            .metric("projected_1000_docs_secs", json!(avg_ms * 1000.0 / 1000.0))
            .metric("projected_10000_docs_secs", json!(avg_ms * 10000.0 / 1000.0));

        if inserted == 0 && self.batch_size > 0 {
            builder.error("no document was uploaded").build()
        } else {
            builder.build()
        }
    }
}
