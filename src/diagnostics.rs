//! Store connectivity checks and storage status verification

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::metrics::measure_store_op;
use crate::models::{format_timestamp, Document, SensorKind};
use crate::state::{FindQuery, ReadingFilter, ReadingStore, SortSpec};

/// Outcome of one diagnostic step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckStep {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckStep {
    fn passed(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn failed(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Result of [`check_connection`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub backend: String,
    pub steps: Vec<CheckStep>,
    pub document_count: Option<u64>,
    pub sample: Option<Document>,
}

impl ConnectionReport {
    /// Every step passed
    pub fn is_healthy(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.passed)
    }
}

/// Ping the store, count its documents, fetch a sample and round-trip a probe document.
/// A failed ping ends the check; later failures are recorded and the remaining steps still run.
pub async fn check_connection(store: &Arc<dyn ReadingStore>) -> ConnectionReport {
    let mut report = ConnectionReport {
        backend: store.backend_name().to_string(),
        steps: Vec::new(),
        document_count: None,
        sample: None,
    };

    match measure_store_op("ping", store.ping()).await {
        Ok(()) => report.steps.push(CheckStep::passed("ping", "store reachable")),
        Err(e) => {
            error!(backend = %report.backend, error = %e, "Store ping failed");
            report.steps.push(CheckStep::failed("ping", e.to_string()));
            return report;
        }
    }

    match measure_store_op("count", store.count(&ReadingFilter::all())).await {
        Ok(count) => {
            report.document_count = Some(count);
            report
                .steps
                .push(CheckStep::passed("count", format!("{} documents", count)));
        }
        Err(e) => report.steps.push(CheckStep::failed("count", e.to_string())),
    }

    match measure_store_op("find", store.find(&FindQuery::all().limit(1))).await {
        Ok(mut documents) => {
            let detail = if documents.is_empty() {
                "collection is empty"
            } else {
                "sample document fetched"
            };
            report.sample = documents.pop();
            report.steps.push(CheckStep::passed("sample", detail));
        }
        Err(e) => report.steps.push(CheckStep::failed("sample", e.to_string())),
    }

    report.steps.push(write_probe(store).await);

    if report.is_healthy() {
        info!(backend = %report.backend, "Connection check passed");
    } else {
        warn!(backend = %report.backend, "Connection check found problems");
    }
    report
}

async fn write_probe(store: &Arc<dyn ReadingStore>) -> CheckStep {
    let mut probe = Document::new();
    probe.insert("test".to_string(), Value::Bool(true));
    probe.insert("timestamp".to_string(), json!(format_timestamp(&Utc::now())));

    let id = match measure_store_op("insert", store.insert(probe)).await {
        Ok(id) => id,
        Err(e) => return CheckStep::failed("write_probe", format!("insert failed: {}", e)),
    };

    match measure_store_op("delete", store.delete(&id)).await {
        Ok(true) => CheckStep::passed("write_probe", format!("probe {} inserted and deleted", id)),
        Ok(false) => CheckStep::failed("write_probe", format!("probe {} vanished before delete", id)),
        Err(e) => CheckStep::failed(
            "write_probe",
            format!("probe {} inserted but not deleted: {}", id, e),
        ),
    }
}

/// Summary of what the store currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStatus {
    pub total: u64,
    pub interior: u64,
    pub exterior: u64,
    pub latest: Vec<Document>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

/// Count readings per kind and collect the latest three plus the covered time span
pub async fn storage_status(store: &Arc<dyn ReadingStore>) -> Result<StorageStatus> {
    let total = store.count(&ReadingFilter::all()).await?;
    let interior = store
        .count(&ReadingFilter::all().with_kind(SensorKind::Interior))
        .await?;
    let exterior = store
        .count(&ReadingFilter::all().with_kind(SensorKind::Exterior))
        .await?;

    let latest = store
        .find(&FindQuery::all().sort_by(SortSpec::desc("timestamp")).limit(3))
        .await?;

    let oldest = store
        .find(&FindQuery::all().sort_by(SortSpec::asc("timestamp")).limit(1))
        .await?;

    let timestamp_of = |doc: Option<&Document>| {
        doc.and_then(|d| d.get("timestamp"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let status = StorageStatus {
        total,
        interior,
        exterior,
        first_timestamp: timestamp_of(oldest.first()),
        last_timestamp: timestamp_of(latest.first()),
        latest,
    };

    info!(
        total = status.total,
        interior = status.interior,
        exterior = status.exterior,
        "Storage status collected"
    );
    Ok(status)
}
