use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::generator::ReadingGenerator;
use crate::error::Result;
use crate::metrics::{measure_store_op, record_generated};
use crate::state::ReadingStore;

/// Outcome of a sender run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendSummary {
    pub sent: u64,
    pub failed: u64,
}

/// Generates readings and writes them to a store one at a time
pub struct ReadingSender<R: Rng> {
    store: Arc<dyn ReadingStore>,
    generator: ReadingGenerator<R>,
}

impl<R: Rng> ReadingSender<R> {
    pub fn new(store: Arc<dyn ReadingStore>, generator: ReadingGenerator<R>) -> Self {
        Self { store, generator }
    }

    /// Generate one reading and insert it. Returns the store id.
    pub async fn send_one(&mut self) -> Result<String> {
        let reading = self.generator.generate(None);
        let kind = reading.kind().to_string();
        record_generated(&kind);

        let document = reading.to_document()?;
        let id = measure_store_op("insert", self.store.insert(document)).await?;

        info!(
            device_id = %reading.device_id(),
            kind = %kind,
            temperature = reading.temperature(),
            unit = %reading.unit(),
            document_id = %id,
            "Reading sent"
        );
        Ok(id)
    }

    /// Send readings every `interval` until `max_readings` succeed or Ctrl-C is received.
    /// Failed inserts are logged and do not count toward the maximum.
    pub async fn run(&mut self, interval: Duration, max_readings: Option<u64>) -> SendSummary {
        let mut summary = SendSummary::default();

        info!(
            interval_secs = interval.as_secs_f64(),
            max_readings = ?max_readings,
            backend = self.store.backend_name(),
            "Starting reading sender"
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if max_readings.map_or(false, |max| summary.sent >= max) {
                info!(sent = summary.sent, "Reached maximum number of readings");
                break;
            }

            match self.send_one().await {
                Ok(_) => summary.sent += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(error = %e, failed = summary.failed, "Failed to insert reading");
                }
            }

            if max_readings.map_or(false, |max| summary.sent >= max) {
                continue;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Interrupt received, stopping reading sender");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    debug!("Next reading");
                }
            }
        }

        info!(sent = summary.sent, failed = summary.failed, "Reading sender stopped");
        summary
    }
}
