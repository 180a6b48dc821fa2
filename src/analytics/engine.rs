//! Analyzer: runs queries and aggregations against a reading store

use crate::analytics::aggregation::{
    hourly_temperature_pipeline, readings_by_sensor_pipeline, temperature_by_type_pipeline,
};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::outliers::{find_outliers, FieldSample};
use crate::config::AnalysisConfig;
use crate::metrics::{measure_store_op, record_analysis};
use crate::models::{
    Document, HourlyTemperatureSummary, OutlierRecord, SensorCount, SensorKind,
    TypeTemperatureSummary,
};
use crate::state::{FindQuery, Pipeline, ReadingFilter, ReadingStore, SortSpec};
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Statistical analyzer over the readings held by a store
///
/// Every operation degrades to an empty result when the store fails;
/// the failure is logged and never returned.
pub struct SensorAnalytics {
    store: Arc<dyn ReadingStore>,
    config: AnalysisConfig,
}

impl SensorAnalytics {
    /// Create an analyzer
    pub fn new(store: Arc<dyn ReadingStore>, config: AnalysisConfig) -> Self {
        Self { store, config }
    }

    /// Create with default configuration
    pub fn with_defaults(store: Arc<dyn ReadingStore>) -> Self {
        Self::new(store, AnalysisConfig::default())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Temperature statistics per (UTC hour of day, sensor kind) over the last `hours_back` hours.
    /// Readings from different days at the same hour share a bucket.
    pub async fn hourly_temperature_summary(&self, hours_back: i64) -> Vec<HourlyTemperatureSummary> {
        record_analysis("hourly_temperature");
        let since = Duration::try_hours(hours_back)
            .and_then(|window| Utc::now().checked_sub_signed(window));
        let Some(since) = since else {
            warn!(hours_back, "Summary window is out of range");
            return Vec::new();
        };
        let pipeline = hourly_temperature_pipeline(since);

        let rows = self.run_pipeline("hourly_temperature", &pipeline).await;
        let summary = decode_rows(rows, "hourly_temperature");

        info!(hours_back, buckets = summary.len(), "Hourly temperature summary computed");
        summary
    }

    /// Hourly summary over the configured window
    pub async fn hourly_temperature_summary_default(&self) -> Vec<HourlyTemperatureSummary> {
        self.hourly_temperature_summary(self.config.hours_back).await
    }

    /// Reading totals per device, most active first
    pub async fn readings_count_by_sensor(&self) -> Vec<SensorCount> {
        record_analysis("count_by_sensor");
        let rows = self
            .run_pipeline("count_by_sensor", &readings_by_sensor_pipeline())
            .await;
        let counts: Vec<SensorCount> = decode_rows(rows, "count_by_sensor");

        info!(devices = counts.len(), "Per-sensor reading counts computed");
        counts
    }

    /// Readings whose `field` lies more than `z_threshold` sample standard deviations from the mean
    pub async fn detect_outliers(&self, field: &str, z_threshold: f64) -> Vec<OutlierRecord> {
        record_analysis("outliers");

        match self.try_detect_outliers(field, z_threshold).await {
            Ok(outliers) => {
                info!(field, z_threshold, outliers = outliers.len(), "Outlier detection finished");
                outliers
            }
            Err(AnalyticsError::Store(msg)) => {
                error!(field, error = %msg, "Outlier detection failed");
                Vec::new()
            }
            Err(e) => {
                warn!(field, reason = %e, "No outliers computed");
                Vec::new()
            }
        }
    }

    /// Outlier detection with the configured field and threshold
    pub async fn detect_outliers_default(&self) -> Vec<OutlierRecord> {
        let field = self.config.outlier_field.clone();
        self.detect_outliers(&field, self.config.z_threshold).await
    }

    /// Outlier detection that reports why nothing could be computed
    pub async fn try_detect_outliers(
        &self,
        field: &str,
        z_threshold: f64,
    ) -> AnalyticsResult<Vec<OutlierRecord>> {
        let query = FindQuery::new(ReadingFilter::all().with_field(field));
        let documents = measure_store_op("find", self.store.find(&query)).await?;

        let samples: Vec<FieldSample> = documents
            .iter()
            .filter_map(|doc| FieldSample::from_document(doc, field))
            .collect();

        debug!(field, documents = documents.len(), samples = samples.len(), "Collected field samples");
        find_outliers(&samples, field, z_threshold)
    }

    /// Celsius temperature statistics per sensor kind
    pub async fn average_temperature_by_type(&self) -> Vec<TypeTemperatureSummary> {
        record_analysis("temperature_by_type");
        let rows = self
            .run_pipeline("temperature_by_type", &temperature_by_type_pipeline())
            .await;
        decode_rows(rows, "temperature_by_type")
    }

    /// The `n` most recent readings
    pub async fn last_readings(&self, n: usize) -> Vec<Document> {
        let query = FindQuery::all()
            .sort_by(SortSpec::desc("timestamp"))
            .limit(n);
        self.run_find("last_readings", &query).await
    }

    /// Readings of one sensor kind, newest first
    pub async fn readings_by_kind(&self, kind: SensorKind) -> Vec<Document> {
        let query = FindQuery::new(ReadingFilter::all().with_kind(kind))
            .sort_by(SortSpec::desc("timestamp"));
        self.run_find("readings_by_kind", &query).await
    }

    /// Readings taken at one location, newest first
    pub async fn readings_by_location(&self, location: &str) -> Vec<Document> {
        let query = FindQuery::new(ReadingFilter::all().with_location(location))
            .sort_by(SortSpec::desc("timestamp"));
        self.run_find("readings_by_location", &query).await
    }

    async fn run_pipeline(&self, analysis: &str, pipeline: &Pipeline) -> Vec<Document> {
        match measure_store_op("aggregate", self.store.aggregate(pipeline)).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(analysis, error = %e, "Aggregation failed");
                Vec::new()
            }
        }
    }

    async fn run_find(&self, query_name: &str, query: &FindQuery) -> Vec<Document> {
        match measure_store_op("find", self.store.find(query)).await {
            Ok(documents) => {
                debug!(query = query_name, results = documents.len(), "Query finished");
                documents
            }
            Err(e) => {
                error!(query = query_name, error = %e, "Query failed");
                Vec::new()
            }
        }
    }
}

/// Decode result rows, skipping rows that do not fit the expected shape
fn decode_rows<T: DeserializeOwned>(rows: Vec<Document>, analysis: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(serde_json::Value::Object(row)) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(analysis, error = %e, "Skipping malformed result row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::simulator::ReadingGenerator;
    use crate::state::InMemoryStore;
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait]
    impl ReadingStore for UnreachableStore {
        fn backend_name(&self) -> &'static str {
            "unreachable"
        }

        async fn ping(&self) -> Result<()> {
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }

        async fn insert(&self, _document: Document) -> Result<String> {
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }

        async fn find(&self, _query: &FindQuery) -> Result<Vec<Document>> {
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }

        async fn count(&self, _filter: &ReadingFilter) -> Result<u64> {
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }

        async fn delete(&self, _id: &str) -> Result<bool> {
            Err(AppError::StoreUnavailable("connection refused".to_string()))
        }
    }

    async fn seeded_store(count: usize) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let mut generator = ReadingGenerator::seeded(21);
        for reading in generator.generate_batch(count) {
            store.insert(reading.to_document().unwrap()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_empty() {
        let analytics = SensorAnalytics::with_defaults(Arc::new(UnreachableStore));

        assert!(analytics.hourly_temperature_summary(24).await.is_empty());
        assert!(analytics.readings_count_by_sensor().await.is_empty());
        assert!(analytics.detect_outliers("temperature", 2.5).await.is_empty());
        assert!(analytics.average_temperature_by_type().await.is_empty());
        assert!(analytics.last_readings(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_counts_sum_to_total() {
        let store = seeded_store(60).await;
        let analytics = SensorAnalytics::with_defaults(store);

        let counts = analytics.readings_count_by_sensor().await;
        let total: u64 = counts.iter().map(|c| c.total_readings).sum();

        assert_eq!(total, 60);
        assert!(counts.windows(2).all(|w| w[0].total_readings >= w[1].total_readings));
    }

    #[tokio::test]
    async fn test_hourly_summary_of_fresh_readings() {
        let store = seeded_store(30).await;
        let analytics = SensorAnalytics::with_defaults(store);

        let summary = analytics.hourly_temperature_summary(1).await;
        let total: u64 = summary.iter().map(|s| s.readings_count).sum();

        assert_eq!(total, 30);
        for bucket in &summary {
            let avg = bucket.average_temperature_celsius.unwrap();
            assert!((5.0..=35.0).contains(&avg));
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let analytics = SensorAnalytics::with_defaults(Arc::new(InMemoryStore::new()));

        assert!(analytics.hourly_temperature_summary(24).await.is_empty());
        assert!(analytics.hourly_temperature_summary_default().await.is_empty());
        assert_eq!(
            analytics.try_detect_outliers("temperature", 2.5).await,
            Err(AnalyticsError::InsufficientSample {
                required: 2,
                available: 0
            })
        );
    }

    #[tokio::test]
    async fn test_hourly_summary_window_out_of_range() {
        let store = seeded_store(5).await;
        let analytics = SensorAnalytics::with_defaults(store);

        assert!(analytics.hourly_temperature_summary(i64::MAX / 1000).await.is_empty());
        assert!(analytics.hourly_temperature_summary(i64::MAX).await.is_empty());
        assert!(analytics.hourly_temperature_summary(i64::MIN).await.is_empty());
        let total: u64 = analytics
            .hourly_temperature_summary_default()
            .await
            .iter()
            .map(|s| s.readings_count)
            .sum();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_last_readings_limit() {
        let store = seeded_store(15).await;
        let analytics = SensorAnalytics::with_defaults(store);

        assert_eq!(analytics.last_readings(10).await.len(), 10);
        let interior = analytics.readings_by_kind(SensorKind::Interior).await;
        assert!(interior.iter().all(|d| d["type"] == "interior"));
    }
}
