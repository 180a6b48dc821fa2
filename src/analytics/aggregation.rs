//! Aggregation pipelines behind the analyzer's summaries.

use chrono::{DateTime, Utc};

use crate::state::{Accumulator, Expr, GroupKey, Pipeline, ReadingFilter, SortSpec};

/// Average, min, max and count of Celsius temperature per (hour of day, sensor kind)
/// for readings at or after `since`
pub fn hourly_temperature_pipeline(since: DateTime<Utc>) -> Pipeline {
    Pipeline::new()
        .matching(ReadingFilter::all().since(since))
        .project(vec![
            ("hour", Expr::HourOf("timestamp".to_string())),
            ("temperature_celsius", Expr::CelsiusTemperature),
            ("type", Expr::field("type")),
        ])
        .group(
            GroupKey::Composite(vec![
                ("hour".to_string(), Expr::field("hour")),
                ("type".to_string(), Expr::field("type")),
            ]),
            vec![
                ("avg_temp", Accumulator::Avg(Expr::field("temperature_celsius"))),
                ("count", Accumulator::Count),
                ("min_temp", Accumulator::Min(Expr::field("temperature_celsius"))),
                ("max_temp", Accumulator::Max(Expr::field("temperature_celsius"))),
            ],
        )
        .project(vec![
            ("hour", Expr::field("_id.hour")),
            ("sensor_type", Expr::field("_id.type")),
            ("average_temperature_celsius", Expr::round(Expr::field("avg_temp"), 2)),
            ("min_temperature_celsius", Expr::round(Expr::field("min_temp"), 2)),
            ("max_temperature_celsius", Expr::round(Expr::field("max_temp"), 2)),
            ("readings_count", Expr::field("count")),
        ])
        .sort(vec![SortSpec::asc("hour"), SortSpec::asc("sensor_type")])
}

/// Reading count per device with first-seen kind and location and the time span covered
pub fn readings_by_sensor_pipeline() -> Pipeline {
    Pipeline::new()
        .group(
            GroupKey::Single(Expr::field("device_id")),
            vec![
                ("total_readings", Accumulator::Count),
                ("sensor_type", Accumulator::First(Expr::field("type"))),
                ("location", Accumulator::First(Expr::field("location"))),
                ("first_reading", Accumulator::Min(Expr::field("timestamp"))),
                ("last_reading", Accumulator::Max(Expr::field("timestamp"))),
            ],
        )
        .project(vec![
            ("device_id", Expr::field("_id")),
            ("total_readings", Expr::field("total_readings")),
            ("sensor_type", Expr::field("sensor_type")),
            ("location", Expr::field("location")),
            ("first_reading", Expr::field("first_reading")),
            ("last_reading", Expr::field("last_reading")),
        ])
        .sort(vec![SortSpec::desc("total_readings")])
}

/// Celsius temperature statistics per sensor kind over the whole collection
pub fn temperature_by_type_pipeline() -> Pipeline {
    Pipeline::new()
        .project(vec![
            ("type", Expr::field("type")),
            ("temperature_celsius", Expr::CelsiusTemperature),
        ])
        .group(
            GroupKey::Single(Expr::field("type")),
            vec![
                ("avg_temp", Accumulator::Avg(Expr::field("temperature_celsius"))),
                ("min_temp", Accumulator::Min(Expr::field("temperature_celsius"))),
                ("max_temp", Accumulator::Max(Expr::field("temperature_celsius"))),
                ("count", Accumulator::Count),
            ],
        )
        .project(vec![
            ("sensor_type", Expr::field("_id")),
            ("average_temperature_celsius", Expr::round(Expr::field("avg_temp"), 2)),
            ("min_temperature_celsius", Expr::round(Expr::field("min_temp"), 2)),
            ("max_temperature_celsius", Expr::round(Expr::field("max_temp"), 2)),
            ("total_readings", Expr::field("count")),
        ])
        .sort(vec![SortSpec::asc("sensor_type")])
}
