//! Sensor readings and their flat stored document form

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::units::{normalize_temperature, TemperatureUnit};
use super::Document;
use crate::error::{AppError, Result};

/// Sensor family. Decides the schema and the temperature unit of a reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SensorKind {
    Interior,
    Exterior,
}

impl SensorKind {
    /// Unit every reading of this family is expressed in
    pub fn unit(&self) -> TemperatureUnit {
        match self {
            SensorKind::Interior => TemperatureUnit::C,
            SensorKind::Exterior => TemperatureUnit::F,
        }
    }
}

/// Fields every reading carries regardless of its family
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBase {
    pub device_id: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

impl ReadingBase {
    /// Stamp a new base with the current instant
    pub fn now(device_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            location: location.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One immutable sensor observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReadingDocument", try_from = "ReadingDocument")]
pub enum SensorReading {
    /// Indoor sensor, Celsius, with humidity
    Interior {
        base: ReadingBase,
        temperature: f64,
        humidity: u32,
        light: u32,
    },
    /// Outdoor sensor, Fahrenheit, with UV index
    Exterior {
        base: ReadingBase,
        temperature: f64,
        light: u32,
        uv_index: f64,
    },
}

impl SensorReading {
    pub fn base(&self) -> &ReadingBase {
        match self {
            SensorReading::Interior { base, .. } | SensorReading::Exterior { base, .. } => base,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.base().device_id
    }

    pub fn location(&self) -> &str {
        &self.base().location
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.base().timestamp
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Interior { .. } => SensorKind::Interior,
            SensorReading::Exterior { .. } => SensorKind::Exterior,
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.kind().unit()
    }

    /// Temperature in the reading's own unit
    pub fn temperature(&self) -> f64 {
        match self {
            SensorReading::Interior { temperature, .. }
            | SensorReading::Exterior { temperature, .. } => *temperature,
        }
    }

    /// Temperature expressed in Celsius
    pub fn temperature_celsius(&self) -> f64 {
        normalize_temperature(self.temperature(), self.unit())
    }

    pub fn light(&self) -> u32 {
        match self {
            SensorReading::Interior { light, .. } | SensorReading::Exterior { light, .. } => *light,
        }
    }

    pub fn humidity(&self) -> Option<u32> {
        match self {
            SensorReading::Interior { humidity, .. } => Some(*humidity),
            SensorReading::Exterior { .. } => None,
        }
    }

    pub fn uv_index(&self) -> Option<f64> {
        match self {
            SensorReading::Interior { .. } => None,
            SensorReading::Exterior { uv_index, .. } => Some(*uv_index),
        }
    }

    /// Flat document as persisted by the store
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(AppError::Serialization(format!(
                "Reading serialized to a non-object value: {}",
                other
            ))),
        }
    }

    /// Rebuild a reading from a stored document. Store metadata such as `_id` is ignored.
    pub fn from_document(document: &Document) -> Result<Self> {
        let value = serde_json::Value::Object(document.clone());
        Ok(serde_json::from_value(value)?)
    }
}

/// Render an instant the way readings store it: RFC 3339 with microseconds and `+00:00`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a stored timestamp into a UTC instant
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

/// Wire shape of a reading: one flat mapping whose optional fields depend on `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingDocument {
    pub device_id: String,

    #[serde(rename = "type")]
    pub kind: SensorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,

    pub unit: TemperatureUnit,

    pub location: String,

    pub timestamp: String,
}

impl From<SensorReading> for ReadingDocument {
    fn from(reading: SensorReading) -> Self {
        let kind = reading.kind();
        match reading {
            SensorReading::Interior {
                base,
                temperature,
                humidity,
                light,
            } => Self {
                device_id: base.device_id,
                kind,
                temperature: Some(temperature),
                humidity: Some(humidity),
                light: Some(light),
                uv_index: None,
                unit: kind.unit(),
                location: base.location,
                timestamp: format_timestamp(&base.timestamp),
            },
            SensorReading::Exterior {
                base,
                temperature,
                light,
                uv_index,
            } => Self {
                device_id: base.device_id,
                kind,
                temperature: Some(temperature),
                humidity: None,
                light: Some(light),
                uv_index: Some(uv_index),
                unit: kind.unit(),
                location: base.location,
                timestamp: format_timestamp(&base.timestamp),
            },
        }
    }
}

impl TryFrom<ReadingDocument> for SensorReading {
    type Error = String;

    fn try_from(doc: ReadingDocument) -> std::result::Result<Self, Self::Error> {
        if doc.unit != doc.kind.unit() {
            return Err(format!(
                "{} reading must be in {}, found {}",
                doc.kind,
                doc.kind.unit(),
                doc.unit
            ));
        }

        let timestamp = parse_timestamp(&doc.timestamp)
            .ok_or_else(|| format!("invalid timestamp '{}'", doc.timestamp))?;
        let temperature = doc
            .temperature
            .ok_or_else(|| "missing temperature".to_string())?;
        let light = doc.light.ok_or_else(|| "missing light".to_string())?;
        let base = ReadingBase {
            device_id: doc.device_id,
            location: doc.location,
            timestamp,
        };

        match doc.kind {
            SensorKind::Interior => {
                if doc.uv_index.is_some() {
                    return Err("interior reading cannot carry uv_index".to_string());
                }
                let humidity = doc.humidity.ok_or_else(|| "missing humidity".to_string())?;
                Ok(SensorReading::Interior {
                    base,
                    temperature,
                    humidity,
                    light,
                })
            }
            SensorKind::Exterior => {
                if doc.humidity.is_some() {
                    return Err("exterior reading cannot carry humidity".to_string());
                }
                let uv_index = doc.uv_index.ok_or_else(|| "missing uv_index".to_string())?;
                Ok(SensorReading::Exterior {
                    base,
                    temperature,
                    light,
                    uv_index,
                })
            }
        }
    }
}
