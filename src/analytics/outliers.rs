//! Z-score outlier detection over one numeric field of the stored readings.

use serde_json::Value;

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::ZScoreModel;
use crate::models::{normalize_temperature, round_to, Document, OutlierRecord, TemperatureUnit};

/// One observed value of the analyzed field with the context reported for outliers
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSample {
    pub device_id: Option<String>,
    pub sensor_type: Option<String>,
    pub timestamp: Option<String>,
    pub unit: Option<TemperatureUnit>,
    /// Value as stored
    pub value: f64,
    /// Value on the common scale used for statistics
    pub normalized: f64,
}

impl FieldSample {
    /// Extract a sample from a stored document. Documents whose field is not numeric yield `None`.
    pub fn from_document(doc: &Document, field: &str) -> Option<Self> {
        let value = doc.get(field)?.as_f64()?;
        let unit = doc
            .get("unit")
            .and_then(Value::as_str)
            .and_then(|u| u.parse::<TemperatureUnit>().ok());

        let normalized = match (field, unit) {
            ("temperature", Some(unit)) => normalize_temperature(value, unit),
            _ => value,
        };

        Some(Self {
            device_id: string_field(doc, "device_id"),
            sensor_type: string_field(doc, "type"),
            timestamp: string_field(doc, "timestamp"),
            unit,
            value,
            normalized,
        })
    }
}

fn string_field(doc: &Document, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Samples strictly farther than `z_threshold` standard deviations from the mean,
/// highest z-score first. Ties keep their input order.
pub fn find_outliers(
    samples: &[FieldSample],
    field: &str,
    z_threshold: f64,
) -> AnalyticsResult<Vec<OutlierRecord>> {
    if field.is_empty() {
        return Err(AnalyticsError::InvalidField("field name is empty".to_string()));
    }

    let values: Vec<f64> = samples.iter().map(|s| s.normalized).collect();
    let model = ZScoreModel::fit(&values)?;
    let is_temperature = field == "temperature";

    let mut outliers: Vec<OutlierRecord> = samples
        .iter()
        .filter_map(|sample| {
            let z = model.z_score(sample.normalized);
            if z <= z_threshold {
                return None;
            }

            let value_celsius = if is_temperature {
                round_to(sample.normalized, 2)
            } else {
                sample.value
            };

            Some(OutlierRecord {
                device_id: sample.device_id.clone(),
                sensor_type: sample.sensor_type.clone(),
                timestamp: sample.timestamp.clone(),
                field: field.to_string(),
                value: sample.value,
                unit: sample.unit,
                z_score: round_to(z, 3),
                value_celsius,
                mean: round_to(model.mean, 2),
                std_dev: round_to(model.std_dev, 2),
            })
        })
        .collect();

    outliers.sort_by(|a, b| b.z_score.total_cmp(&a.z_score));
    Ok(outliers)
}
