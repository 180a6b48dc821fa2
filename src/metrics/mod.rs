/// Prometheus metrics for the sensor simulator and analyzer.
///
/// Covers reading generation, store round trips and analysis runs.
/// Everything registers into one global registry exported as text by
/// [`gather_metrics`].
///
/// # Example
/// ```no_run
/// use iot_sensor_analytics::metrics::READINGS_GENERATED_TOTAL;
///
/// READINGS_GENERATED_TOTAL
///     .with_label_values(&["interior"])
///     .inc();
/// ```

mod decorators;

pub use decorators::*;

use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of readings produced by the generator
    ///
    /// Labels: kind
    pub static ref READINGS_GENERATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("readings_generated_total", "Total number of sensor readings generated")
            .namespace("iot_sensor_analytics"),
        &["kind"]
    ).expect("Failed to create READINGS_GENERATED_TOTAL metric");

    /// Total number of store operations
    ///
    /// Labels: operation, status
    pub static ref STORE_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("store_operations_total", "Total number of store operations")
            .namespace("iot_sensor_analytics"),
        &["operation", "status"]
    ).expect("Failed to create STORE_OPERATIONS_TOTAL metric");

    /// Store operation duration in seconds
    ///
    /// Labels: operation
    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "store_operation_duration_seconds",
            "Store operation duration in seconds"
        )
        .namespace("iot_sensor_analytics")
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"]
    ).expect("Failed to create STORE_OPERATION_DURATION_SECONDS metric");

    /// Total number of analyzer runs
    ///
    /// Labels: analysis
    pub static ref ANALYSIS_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("analysis_runs_total", "Total number of analyzer runs")
            .namespace("iot_sensor_analytics"),
        &["analysis"]
    ).expect("Failed to create ANALYSIS_RUNS_TOTAL metric");
}

/// Register all metrics with the global registry
///
/// Call once at startup. A second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(READINGS_GENERATED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(STORE_OPERATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(STORE_OPERATION_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ANALYSIS_RUNS_TOTAL.clone()))?;

    tracing::info!("Prometheus metrics registered");
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // Global registry: a second registration in the same process is rejected
        let _ = init_metrics();
        assert!(init_metrics().is_err());
    }

    #[test]
    fn test_generated_counter() {
        READINGS_GENERATED_TOTAL.with_label_values(&["exterior"]).inc();

        let value = READINGS_GENERATED_TOTAL
            .with_label_values(&["exterior"])
            .get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        let _ = init_metrics();
        READINGS_GENERATED_TOTAL.with_label_values(&["interior"]).inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("iot_sensor_analytics_readings_generated_total"));
    }
}
