use serde::{Deserialize, Serialize};

use super::units::TemperatureUnit;

/// Temperature statistics for one (hour of day, sensor kind) bucket
///
/// `sensor_type` holds the stored `type` as is; `None` groups documents without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTemperatureSummary {
    pub hour: u32,
    #[serde(default)]
    pub sensor_type: Option<String>,
    pub average_temperature_celsius: Option<f64>,
    pub min_temperature_celsius: Option<f64>,
    pub max_temperature_celsius: Option<f64>,
    pub readings_count: u64,
}

/// Reading totals for one device, `device_id` is `None` for documents without one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCount {
    #[serde(default)]
    pub device_id: Option<String>,
    pub total_readings: u64,
    #[serde(default)]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub first_reading: Option<String>,
    #[serde(default)]
    pub last_reading: Option<String>,
}

/// A reading whose value sits more than the threshold away from the mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRecord {
    pub device_id: Option<String>,
    pub sensor_type: Option<String>,
    pub timestamp: Option<String>,
    pub field: String,
    pub value: f64,
    pub unit: Option<TemperatureUnit>,
    pub z_score: f64,
    pub value_celsius: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Temperature statistics for one sensor kind across the whole collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTemperatureSummary {
    #[serde(default)]
    pub sensor_type: Option<String>,
    pub average_temperature_celsius: Option<f64>,
    pub min_temperature_celsius: Option<f64>,
    pub max_temperature_celsius: Option<f64>,
    pub total_readings: u64,
}
