//! Plain-text rendering of analyzer output

use std::fmt::Write;

use crate::models::{
    Document, HourlyTemperatureSummary, OutlierRecord, SensorCount, TypeTemperatureSummary,
};
use crate::state::ID_FIELD;

const RULE_WIDTH: usize = 80;
const MAX_LISTED_READINGS: usize = 5;
const MAX_LISTED_OUTLIERS: usize = 10;

fn header(out: &mut String, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{}\n{}\n{}", rule, title, rule);
}

fn celsius(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{}°C", v))
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

pub fn render_hourly(results: &[HourlyTemperatureSummary]) -> String {
    let mut out = String::new();
    header(&mut out, "AVERAGE TEMPERATURE BY HOUR");

    if results.is_empty() {
        out.push_str("No data to display.\n");
        return out;
    }

    let mut current_hour = None;
    for row in results {
        if current_hour != Some(row.hour) {
            let _ = writeln!(out, "\nHour {:02}:00", row.hour);
            current_hour = Some(row.hour);
        }
        let _ = writeln!(out, "  Type: {}", text(row.sensor_type.as_deref()));
        let _ = writeln!(out, "    Average: {}", celsius(row.average_temperature_celsius));
        let _ = writeln!(
            out,
            "    Range: {} - {}",
            celsius(row.min_temperature_celsius),
            celsius(row.max_temperature_celsius)
        );
        let _ = writeln!(out, "    Readings: {}", row.readings_count);
    }
    out
}

pub fn render_sensor_counts(results: &[SensorCount]) -> String {
    let mut out = String::new();
    header(&mut out, "READINGS BY SENSOR");

    if results.is_empty() {
        out.push_str("No data to display.\n");
        return out;
    }

    let total: u64 = results.iter().map(|r| r.total_readings).sum();
    let _ = writeln!(out, "\nTotal readings in the store: {}\n", total);

    for row in results {
        let share = if total > 0 {
            row.total_readings as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "  {} ({}) - {}",
            text(row.device_id.as_deref()),
            text(row.sensor_type.as_deref()),
            text(row.location.as_deref())
        );
        let _ = writeln!(out, "    Total: {} readings ({:.1}%)", row.total_readings, share);
        let _ = writeln!(out, "    First reading: {}", text(row.first_reading.as_deref()));
        let _ = writeln!(out, "    Last reading: {}\n", text(row.last_reading.as_deref()));
    }
    out
}

pub fn render_outliers(outliers: &[OutlierRecord], field: &str) -> String {
    let mut out = String::new();
    header(&mut out, &format!("OUTLIERS DETECTED - Field: {}", field));

    if outliers.is_empty() {
        out.push_str("No outliers detected.\n");
        return out;
    }

    let _ = writeln!(out, "\nTotal outliers: {}\n", outliers.len());
    for (i, outlier) in outliers.iter().take(MAX_LISTED_OUTLIERS).enumerate() {
        let unit = outlier.unit.map(|u| u.to_string()).unwrap_or_default();
        let _ = writeln!(out, "Outlier #{}:", i + 1);
        let _ = writeln!(out, "  Device ID: {}", text(outlier.device_id.as_deref()));
        let _ = writeln!(out, "  Type: {}", text(outlier.sensor_type.as_deref()));
        let _ = writeln!(out, "  Timestamp: {}", text(outlier.timestamp.as_deref()));
        let _ = writeln!(out, "  Original value: {} {}", outlier.value, unit);
        if outlier.field == "temperature" {
            let _ = writeln!(out, "  Value in Celsius: {}°C", outlier.value_celsius);
        }
        let _ = writeln!(out, "  Z-score: {}", outlier.z_score);
        let _ = writeln!(out, "  Mean: {}", outlier.mean);
        let _ = writeln!(out, "  Std deviation: {}\n", outlier.std_dev);
    }

    if outliers.len() > MAX_LISTED_OUTLIERS {
        let _ = writeln!(
            out,
            "... and {} more outliers",
            outliers.len() - MAX_LISTED_OUTLIERS
        );
    }
    out
}

pub fn render_type_summary(results: &[TypeTemperatureSummary]) -> String {
    let mut out = String::new();
    header(&mut out, "AVERAGE TEMPERATURE BY SENSOR TYPE");

    if results.is_empty() {
        out.push_str("No data to display.\n");
        return out;
    }

    for row in results {
        let _ = writeln!(out, "  Type: {}", text(row.sensor_type.as_deref()));
        let _ = writeln!(out, "    Average: {}", celsius(row.average_temperature_celsius));
        let _ = writeln!(out, "    Minimum: {}", celsius(row.min_temperature_celsius));
        let _ = writeln!(out, "    Maximum: {}", celsius(row.max_temperature_celsius));
        let _ = writeln!(out, "    Total readings: {}\n", row.total_readings);
    }
    out
}

/// List raw readings, at most five, leaving out store identifiers
pub fn render_readings(readings: &[Document], title: &str) -> String {
    let mut out = String::new();
    header(&mut out, title);

    if readings.is_empty() {
        out.push_str("No records found.\n");
        return out;
    }

    let _ = writeln!(out, "Total records: {}\n", readings.len());
    for (i, reading) in readings.iter().take(MAX_LISTED_READINGS).enumerate() {
        let _ = writeln!(out, "Record {}:", i + 1);
        for (key, value) in reading.iter().filter(|(key, _)| key.as_str() != ID_FIELD) {
            match value.as_str() {
                Some(s) => {
                    let _ = writeln!(out, "  {}: {}", key, s);
                }
                None => {
                    let _ = writeln!(out, "  {}: {}", key, value);
                }
            }
        }
        out.push('\n');
    }

    if readings.len() > MAX_LISTED_READINGS {
        let _ = writeln!(
            out,
            "... and {} more records",
            readings.len() - MAX_LISTED_READINGS
        );
    }
    out
}
