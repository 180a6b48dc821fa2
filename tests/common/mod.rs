//! Common test utilities for store and analytics tests
//!
//! Builds reading documents with controlled values and timestamps so that
//! aggregation results can be asserted exactly.

#![allow(dead_code)]

use chrono::{DateTime, Duration, SubsecRound, Utc};
use iot_sensor_analytics::models::{
    format_timestamp, Document, ReadingBase, SensorKind, SensorReading,
};
use iot_sensor_analytics::state::ReadingStore;

/// Interior reading at a fixed instant
pub fn interior_at(device_id: &str, temperature: f64, timestamp: DateTime<Utc>) -> SensorReading {
    SensorReading::Interior {
        base: ReadingBase {
            device_id: device_id.to_string(),
            location: "living_room".to_string(),
            timestamp,
        },
        temperature,
        humidity: 45,
        light: 300,
    }
}

/// Exterior reading at a fixed instant, temperature in Fahrenheit
pub fn exterior_at(device_id: &str, temperature_f: f64, timestamp: DateTime<Utc>) -> SensorReading {
    SensorReading::Exterior {
        base: ReadingBase {
            device_id: device_id.to_string(),
            location: "garden".to_string(),
            timestamp,
        },
        temperature: temperature_f,
        light: 20_000,
        uv_index: 4.5,
    }
}

/// Now minus `hours`, plus `minutes`, truncated to whole seconds so it survives storage
pub fn hours_ago(hours: i64, minutes: i64) -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0) - Duration::hours(hours) + Duration::minutes(minutes)
}

/// Insert every reading and return the assigned ids
pub async fn insert_all(store: &dyn ReadingStore, readings: &[SensorReading]) -> Vec<String> {
    let mut ids = Vec::with_capacity(readings.len());
    for reading in readings {
        let document = reading.to_document().expect("reading encodes");
        ids.push(store.insert(document).await.expect("insert succeeds"));
    }
    ids
}

/// A raw document outside the reading schema
pub fn raw_document(value: serde_json::Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

/// Document of a given kind with only the fields the filters look at
pub fn typed_document(kind: SensorKind, device_id: &str, timestamp: DateTime<Utc>) -> Document {
    raw_document(serde_json::json!({
        "type": kind.to_string(),
        "device_id": device_id,
        "timestamp": format_timestamp(&timestamp),
    }))
}
