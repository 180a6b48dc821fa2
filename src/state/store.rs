use crate::error::{AppError, Result};
use crate::models::Document;
use crate::state::{FindQuery, Pipeline, ReadingFilter};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Field holding the identifier a store assigns on insert
pub const ID_FIELD: &str = "_id";

/// Trait for sensor reading storage operations
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Short backend name used in logs and diagnostics
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Persist a document and return the identifier assigned to it
    async fn insert(&self, document: Document) -> Result<String>;

    /// Documents matching a query, `_id` included
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>>;

    /// Count documents matching a filter
    async fn count(&self, filter: &ReadingFilter) -> Result<u64>;

    /// Delete a document by identifier. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        let filter = pipeline.leading_filter().cloned().unwrap_or_default();
        let documents = self.find(&FindQuery::new(filter)).await?;
        Ok(pipeline.evaluate(documents))
    }
}

/// Assign a fresh identifier to a document about to be stored
pub(crate) fn assign_id(document: &mut Document) -> String {
    let id = Uuid::now_v7().to_string();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    id
}

/// In-memory reading store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    // Insertion order is kept so scans see documents oldest first
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, mut document: Document) -> Result<String> {
        let id = assign_id(&mut document);
        self.documents.write().push(document);

        tracing::debug!(document_id = %id, "Document inserted");
        Ok(id)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>> {
        let snapshot = self.documents.read().clone();
        Ok(query.apply(snapshot))
    }

    async fn count(&self, filter: &ReadingFilter) -> Result<u64> {
        let count = self
            .documents
            .read()
            .iter()
            .filter(|doc| filter.matches(doc))
            .count();

        Ok(count as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(AppError::Validation("Document id cannot be empty".to_string()));
        }

        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|doc| doc.get(ID_FIELD).and_then(Value::as_str) != Some(id));
        let deleted = documents.len() < before;

        if deleted {
            tracing::debug!(document_id = %id, "Document deleted");
        }
        Ok(deleted)
    }
}
