//! End-to-end tests for the analyzer over a populated store

mod common;

use common::{exterior_at, hours_ago, insert_all, interior_at, raw_document};
use iot_sensor_analytics::{
    analytics::{report, AnalyticsError, SensorAnalytics},
    config::AnalysisConfig,
    models::{format_timestamp, ReadingBase, SensorKind, SensorReading, TemperatureUnit},
    state::{InMemoryStore, ReadingFilter, ReadingStore},
};
use serde_json::json;
use std::sync::Arc;

async fn analytics_over(readings: &[SensorReading]) -> SensorAnalytics {
    let store: Arc<dyn ReadingStore> = Arc::new(InMemoryStore::new());
    insert_all(store.as_ref(), readings).await;
    SensorAnalytics::with_defaults(store)
}

#[tokio::test]
async fn test_outlier_z_score_of_single_spike() {
    let ts = hours_ago(1, 0);
    let analytics = analytics_over(&[
        interior_at("sensor_01", 10.0, ts),
        interior_at("sensor_03", 10.0, ts),
        interior_at("sensor_05", 10.0, ts),
        interior_at("sensor_01", 10.0, ts),
        interior_at("sensor_03", 100.0, ts),
    ])
    .await;

    // mean 28, sample std 40.25, z(100) = 1.789
    let outliers = analytics.detect_outliers("temperature", 1.5).await;
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].device_id.as_deref(), Some("sensor_03"));
    assert_eq!(outliers[0].z_score, 1.789);
    assert_eq!(outliers[0].mean, 28.0);
    assert_eq!(outliers[0].std_dev, 40.25);

    // The default threshold of 2.5 flags nothing
    assert!(analytics.detect_outliers_default().await.is_empty());
}

#[tokio::test]
async fn test_outliers_normalize_fahrenheit() {
    let ts = hours_ago(1, 0);
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, ts),
        interior_at("sensor_03", 20.0, ts),
        interior_at("sensor_05", 20.0, ts),
        interior_at("sensor_01", 20.0, ts),
        exterior_at("sensor_02", 212.0, ts),
    ])
    .await;

    let outliers = analytics.detect_outliers("temperature", 1.5).await;
    assert_eq!(outliers.len(), 1);

    let outlier = &outliers[0];
    assert_eq!(outlier.sensor_type.as_deref(), Some("exterior"));
    assert_eq!(outlier.unit, Some(TemperatureUnit::F));
    assert_eq!(outlier.value, 212.0);
    assert_eq!(outlier.value_celsius, 100.0);
    assert_eq!(outlier.z_score, 1.789);
}

#[tokio::test]
async fn test_outliers_on_constant_values() {
    let ts = hours_ago(1, 0);
    let analytics = analytics_over(&[
        interior_at("sensor_01", 5.0, ts),
        interior_at("sensor_03", 5.0, ts),
        interior_at("sensor_05", 5.0, ts),
        interior_at("sensor_01", 5.0, ts),
    ])
    .await;

    assert!(analytics.detect_outliers("temperature", 0.0).await.is_empty());
    assert_eq!(
        analytics.try_detect_outliers("temperature", 0.0).await,
        Err(AnalyticsError::ZeroVariance)
    );
}

#[tokio::test]
async fn test_outliers_need_two_samples() {
    let analytics = analytics_over(&[interior_at("sensor_01", 21.0, hours_ago(1, 0))]).await;

    assert!(analytics.detect_outliers("temperature", 0.0).await.is_empty());
    assert!(matches!(
        analytics.try_detect_outliers("temperature", 0.0).await,
        Err(AnalyticsError::InsufficientSample { .. })
    ));
}

#[tokio::test]
async fn test_outliers_on_other_field() {
    let ts = hours_ago(1, 0);
    let mut readings: Vec<_> = (0..9).map(|_| exterior_at("sensor_02", 60.0, ts)).collect();
    readings.push(SensorReading::Exterior {
        base: ReadingBase {
            device_id: "sensor_04".to_string(),
            location: "roof".to_string(),
            timestamp: ts,
        },
        temperature: 60.0,
        light: 20_000,
        uv_index: 11.0,
    });
    let analytics = analytics_over(&readings).await;

    let outliers = analytics.detect_outliers("uv_index", 2.5).await;
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].device_id.as_deref(), Some("sensor_04"));
    assert_eq!(outliers[0].value, 11.0);
    // Non-temperature fields are reported as stored
    assert_eq!(outliers[0].value_celsius, 11.0);
}

#[tokio::test]
async fn test_hourly_summary_buckets() {
    let ts = hours_ago(1, 0);
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, ts),
        interior_at("sensor_03", 22.0, ts),
        exterior_at("sensor_02", 68.0, ts),
        // Outside the 24 hour window
        interior_at("sensor_05", 40.0, hours_ago(48, 0)),
    ])
    .await;

    let hourly = analytics.hourly_temperature_summary(24).await;
    assert_eq!(hourly.len(), 2);

    // Same hour, ordered by kind name
    assert_eq!(hourly[0].sensor_type.as_deref(), Some("exterior"));
    assert_eq!(hourly[0].average_temperature_celsius, Some(20.0));
    assert_eq!(hourly[0].readings_count, 1);

    assert_eq!(hourly[1].sensor_type.as_deref(), Some("interior"));
    assert_eq!(hourly[1].average_temperature_celsius, Some(21.0));
    assert_eq!(hourly[1].min_temperature_celsius, Some(20.0));
    assert_eq!(hourly[1].max_temperature_celsius, Some(22.0));
    assert_eq!(hourly[1].readings_count, 2);
    assert_eq!(hourly[0].hour, hourly[1].hour);
}

#[tokio::test]
async fn test_hourly_summary_on_empty_window() {
    let analytics = analytics_over(&[interior_at("sensor_01", 20.0, hours_ago(30, 0))]).await;

    assert!(analytics.hourly_temperature_summary(24).await.is_empty());
    assert_eq!(analytics.hourly_temperature_summary(48).await.len(), 1);
}

#[tokio::test]
async fn test_counts_by_sensor() {
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, hours_ago(3, 0)),
        interior_at("sensor_01", 21.0, hours_ago(2, 0)),
        interior_at("sensor_01", 22.0, hours_ago(1, 0)),
        exterior_at("sensor_02", 70.0, hours_ago(1, 0)),
    ])
    .await;

    let counts = analytics.readings_count_by_sensor().await;
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].device_id.as_deref(), Some("sensor_01"));
    assert_eq!(counts[0].total_readings, 3);
    assert_eq!(counts[0].sensor_type.as_deref(), Some("interior"));
    assert_eq!(counts[0].location.as_deref(), Some("living_room"));
    assert!(counts[0].first_reading < counts[0].last_reading);

    let total: u64 = counts.iter().map(|c| c.total_readings).sum();
    assert_eq!(total, 4);
}

#[tokio::test]
async fn test_average_temperature_by_type() {
    let ts = hours_ago(1, 0);
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, ts),
        interior_at("sensor_03", 24.0, ts),
        exterior_at("sensor_02", 50.0, ts),
        exterior_at("sensor_04", 86.0, ts),
    ])
    .await;

    let by_type = analytics.average_temperature_by_type().await;
    assert_eq!(by_type.len(), 2);

    let interior = by_type
        .iter()
        .find(|t| t.sensor_type.as_deref() == Some("interior"))
        .unwrap();
    assert_eq!(interior.average_temperature_celsius, Some(22.0));
    assert_eq!(interior.total_readings, 2);

    // 50F = 10C and 86F = 30C
    let exterior = by_type
        .iter()
        .find(|t| t.sensor_type.as_deref() == Some("exterior"))
        .unwrap();
    assert_eq!(exterior.average_temperature_celsius, Some(20.0));
    assert_eq!(exterior.min_temperature_celsius, Some(10.0));
    assert_eq!(exterior.max_temperature_celsius, Some(30.0));
}

#[tokio::test]
async fn test_malformed_documents_are_tolerated() {
    let store: Arc<dyn ReadingStore> = Arc::new(InMemoryStore::new());
    insert_all(
        store.as_ref(),
        &[
            interior_at("sensor_01", 20.0, hours_ago(1, 0)),
            interior_at("sensor_03", 22.0, hours_ago(1, 0)),
        ],
    )
    .await;
    store
        .insert(raw_document(json!({"device_id": "sensor_09", "temperature": "warm"})))
        .await
        .unwrap();

    let analytics = SensorAnalytics::new(store, AnalysisConfig::default());

    // The non-numeric temperature is not a sample
    assert!(analytics.detect_outliers("temperature", 0.5).await.len() <= 2);
    let counts = analytics.readings_count_by_sensor().await;
    assert_eq!(counts.iter().map(|c| c.total_readings).sum::<u64>(), 3);

    // The untyped document keeps its own bucket, sorted first
    let by_type = analytics.average_temperature_by_type().await;
    assert_eq!(by_type.len(), 2);
    assert_eq!(by_type[0].sensor_type, None);
    assert_eq!(by_type[0].total_readings, 1);
    assert_eq!(by_type[0].average_temperature_celsius, None);
    assert_eq!(by_type[1].sensor_type.as_deref(), Some("interior"));
    assert_eq!(by_type[1].total_readings, 2);
}

#[tokio::test]
async fn test_documents_without_device_id_are_counted() {
    let store: Arc<dyn ReadingStore> = Arc::new(InMemoryStore::new());
    insert_all(store.as_ref(), &[interior_at("sensor_01", 20.0, hours_ago(1, 0))]).await;
    store
        .insert(raw_document(json!({"test": true, "timestamp": "2025-01-15T10:00:00+00:00"})))
        .await
        .unwrap();

    let analytics = SensorAnalytics::with_defaults(store.clone());
    let counts = analytics.readings_count_by_sensor().await;

    assert_eq!(counts.len(), 2);
    let total: u64 = counts.iter().map(|c| c.total_readings).sum();
    assert_eq!(total, store.count(&ReadingFilter::all()).await.unwrap());

    let anonymous = counts.iter().find(|c| c.device_id.is_none()).unwrap();
    assert_eq!(anonymous.total_readings, 1);
    assert_eq!(anonymous.sensor_type, None);
    assert!(report::render_sensor_counts(&counts).contains("Total readings in the store: 2"));
}

#[tokio::test]
async fn test_unknown_kind_keeps_hourly_bucket() {
    let ts = hours_ago(1, 0);
    let store: Arc<dyn ReadingStore> = Arc::new(InMemoryStore::new());
    insert_all(store.as_ref(), &[interior_at("sensor_01", 20.0, ts)]).await;
    store
        .insert(raw_document(json!({
            "device_id": "sensor_07",
            "type": "greenhouse",
            "temperature": 30.0,
            "unit": "C",
            "timestamp": format_timestamp(&ts),
        })))
        .await
        .unwrap();

    let analytics = SensorAnalytics::with_defaults(store);
    let hourly = analytics.hourly_temperature_summary(24).await;

    assert_eq!(hourly.len(), 2);
    assert_eq!(hourly[0].sensor_type.as_deref(), Some("greenhouse"));
    assert_eq!(hourly[0].average_temperature_celsius, Some(30.0));
    assert_eq!(hourly[1].sensor_type.as_deref(), Some("interior"));

    let by_type = analytics.average_temperature_by_type().await;
    assert!(by_type.iter().any(|t| t.sensor_type.as_deref() == Some("greenhouse")));
}

#[tokio::test]
async fn test_hourly_summary_merges_days() {
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, hours_ago(1, 0)),
        interior_at("sensor_03", 24.0, hours_ago(25, 0)),
    ])
    .await;

    let hourly = analytics.hourly_temperature_summary(48).await;

    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].readings_count, 2);
    assert_eq!(hourly[0].average_temperature_celsius, Some(22.0));
    assert_eq!(hourly[0].min_temperature_celsius, Some(20.0));
    assert_eq!(hourly[0].max_temperature_celsius, Some(24.0));
}

#[tokio::test]
async fn test_constant_inexact_values_yield_no_outliers() {
    let store: Arc<dyn ReadingStore> = Arc::new(InMemoryStore::new());
    for device in ["sensor_01", "sensor_03", "sensor_05"] {
        store
            .insert(raw_document(json!({"device_id": device, "light": 0.1})))
            .await
            .unwrap();
    }
    let analytics = SensorAnalytics::with_defaults(store);

    assert_eq!(
        analytics.try_detect_outliers("light", 0.5).await,
        Err(AnalyticsError::ZeroVariance)
    );
    assert!(analytics.detect_outliers("light", 0.0).await.is_empty());
}

#[tokio::test]
async fn test_constant_fahrenheit_yields_no_outliers() {
    let ts = hours_ago(1, 0);
    let readings: Vec<_> = (0..7).map(|_| exterior_at("sensor_02", 70.0, ts)).collect();
    let analytics = analytics_over(&readings).await;

    assert!(analytics.detect_outliers("temperature", 0.0).await.is_empty());
}

#[tokio::test]
async fn test_queries_and_reports() {
    let analytics = analytics_over(&[
        interior_at("sensor_01", 20.0, hours_ago(3, 0)),
        exterior_at("sensor_02", 70.0, hours_ago(2, 0)),
        interior_at("sensor_03", 22.0, hours_ago(1, 0)),
    ])
    .await;

    let latest = analytics.last_readings(2).await;
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0]["device_id"], json!("sensor_03"));

    assert_eq!(analytics.readings_by_kind(SensorKind::Interior).await.len(), 2);
    assert_eq!(analytics.readings_by_location("garden").await.len(), 1);

    let rendered = report::render_readings(&latest, "LAST 2 READINGS");
    assert!(rendered.contains("LAST 2 READINGS"));
    assert!(rendered.contains("sensor_03"));
    assert!(!rendered.contains("_id"));

    let counts = analytics.readings_count_by_sensor().await;
    assert!(report::render_sensor_counts(&counts).contains("Total readings in the store: 3"));
}
