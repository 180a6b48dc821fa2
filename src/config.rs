use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store backend configuration
    pub store: StoreConfig,

    /// Reading simulator configuration
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Analysis defaults
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Performance measurement configuration
    #[serde(default)]
    pub benchmarks: BenchmarksConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default location and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration layering embedded defaults, an optional file and environment
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: IOT_SENSOR_)
            .add_source(
                config::Environment::with_prefix("IOT_SENSOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            simulator: SimulatorConfig::default(),
            analysis: AnalysisConfig::default(),
            benchmarks: BenchmarksConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path for the embedded database (sled)
    pub path: Option<PathBuf>,

    /// Logical database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding the sensor readings
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            database: default_database(),
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Seconds between two readings sent by the sender loop
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Stop after this many successful inserts (unbounded when absent)
    pub max_readings: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_readings: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Window for the hourly temperature summary
    #[serde(default = "default_hours_back")]
    pub hours_back: i64,

    /// Z-score above which a reading is an outlier
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    /// Field inspected by outlier detection
    #[serde(default = "default_outlier_field")]
    pub outlier_field: String,

    /// Number of readings returned by the "latest readings" query
    #[serde(default = "default_last_n")]
    pub last_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hours_back: default_hours_back(),
            z_threshold: default_z_threshold(),
            outlier_field: default_outlier_field(),
            last_n: default_last_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarksConfig {
    /// Inserts performed by the latency measurement
    #[serde(default = "default_insert_count")]
    pub insert_count: usize,

    /// Duration of the throughput measurement
    #[serde(default = "default_throughput_secs")]
    pub throughput_secs: u64,

    /// Documents uploaded by the batch measurement
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Where benchmark results are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BenchmarksConfig {
    fn default() -> Self {
        Self {
            insert_count: default_insert_count(),
            throughput_secs: default_throughput_secs(),
            batch_size: default_batch_size(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: default_true(),
        }
    }
}

// Default value functions
fn default_database() -> String {
    "iot_data".to_string()
}

fn default_collection() -> String {
    "sensor_readings".to_string()
}

fn default_interval() -> u64 {
    5
}

fn default_hours_back() -> i64 {
    24
}

fn default_z_threshold() -> f64 {
    2.5
}

fn default_outlier_field() -> String {
    "temperature".to_string()
}

fn default_last_n() -> usize {
    10
}

fn default_insert_count() -> usize {
    100
}

fn default_throughput_secs() -> u64 {
    10
}

fn default_batch_size() -> usize {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("benchmarks/output")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
