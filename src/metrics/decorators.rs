//! Timing wrappers that record store round trips.

use super::*;
use std::future::Future;
use std::time::Instant;

/// Await a store operation, recording its duration and outcome
///
/// # Example
/// ```no_run
/// # async fn demo(store: std::sync::Arc<dyn iot_sensor_analytics::state::ReadingStore>) {
/// use iot_sensor_analytics::metrics::measure_store_op;
/// use iot_sensor_analytics::state::ReadingFilter;
///
/// let total = measure_store_op("count", store.count(&ReadingFilter::all())).await;
/// # }
/// ```
pub async fn measure_store_op<F, T, E>(operation: &str, f: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = f.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

/// Count one generated reading of the given kind
pub fn record_generated(kind: &str) {
    READINGS_GENERATED_TOTAL.with_label_values(&[kind]).inc();
}

/// Count one analyzer run
pub fn record_analysis(analysis: &str) {
    ANALYSIS_RUNS_TOTAL.with_label_values(&[analysis]).inc();
}
