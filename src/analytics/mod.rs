//! Statistical analysis of stored sensor readings
//!
//! This module turns the raw documents held by a [`ReadingStore`](crate::state::ReadingStore)
//! into summaries:
//!
//! - **Hourly temperature**: average, min and max Celsius temperature per hour of day and sensor kind
//! - **Per-sensor counts**: reading totals and the time span covered by each device
//! - **Outliers**: z-score detection over any numeric field, with Fahrenheit normalized to Celsius
//! - **Per-kind temperature**: Celsius statistics across the whole collection
//!
//! Analyzer operations never fail: store errors are logged and produce empty results.
//!
//! # Example
//!
//! ```no_run
//! use iot_sensor_analytics::analytics::{report, SensorAnalytics};
//! use iot_sensor_analytics::state::create_in_memory_store;
//!
//! #[tokio::main]
//! async fn main() {
//!     let analytics = SensorAnalytics::with_defaults(create_in_memory_store());
//!
//!     let hourly = analytics.hourly_temperature_summary(24).await;
//!     println!("{}", report::render_hourly(&hourly));
//! }
//! ```

mod aggregation;
mod engine;
mod error;
mod outliers;
pub mod report;
mod statistics;

pub use aggregation::{
    hourly_temperature_pipeline, readings_by_sensor_pipeline, temperature_by_type_pipeline,
};
pub use engine::SensorAnalytics;
pub use error::{AnalyticsError, AnalyticsResult};
pub use outliers::{find_outliers, FieldSample};
pub use statistics::{mean, percentile, sample_std_dev, Distribution, Percentiles, ZScoreModel};
