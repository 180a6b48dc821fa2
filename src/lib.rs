//! IoT Sensor Analytics
//!
//! Generates synthetic interior and exterior sensor readings, stores them as
//! JSON documents and analyzes them: hourly temperature summaries, per-sensor
//! counts, per-kind temperature statistics and z-score outlier detection.
//!
//! # Layout
//!
//! - [`simulator`]: reading generator and the periodic sender loop
//! - [`state`]: the [`ReadingStore`](state::ReadingStore) adapter, queries and the pipeline evaluator
//! - [`analytics`]: the analyzer and its text reports
//! - [`diagnostics`]: connection checks and storage status
//! - [`adapters`] and [`benchmarks`]: store performance measurement

pub mod adapters;
pub mod analytics;
pub mod benchmarks;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod models;
pub mod simulator;
pub mod state;

pub use analytics::SensorAnalytics;
pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Document, SensorKind, SensorReading, TemperatureUnit};
pub use simulator::{ReadingGenerator, ReadingSender};
pub use state::{create_store, ReadingStore};
