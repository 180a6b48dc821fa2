use crate::error::{AppError, Result};
use crate::models::Document;
use crate::state::store::assign_id;
use crate::state::{FindQuery, ReadingFilter, ReadingStore};
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent reading store using Sled embedded database
///
/// Documents live in a tree named after the collection, keyed by a
/// monotonically increasing sequence number so scans return them in
/// insertion order. A second tree maps document ids to sequence keys.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    documents_tree: sled::Tree,
    ids_tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) a store at the specified path
    pub fn new<P: AsRef<Path>>(path: P, collection: &str) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open Sled database: {}", e))
        })?;

        let documents_tree = db.open_tree(collection).map_err(|e| {
            AppError::Internal(format!("Failed to open {} tree: {}", collection, e))
        })?;

        let ids_tree = db.open_tree(format!("{}_ids", collection)).map_err(|e| {
            AppError::Internal(format!("Failed to open {} id index: {}", collection, e))
        })?;

        tracing::info!(collection = %collection, "Initialized Sled store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            documents_tree,
            ids_tree,
        })
    }

    fn serialize_document(document: &Document) -> Result<Vec<u8>> {
        serde_json::to_vec(document).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize document: {}", e))
        })
    }

    fn deserialize_document(bytes: &[u8]) -> Result<Document> {
        serde_json::from_slice(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize document: {}", e))
        })
    }

    /// All documents in insertion order
    fn scan(&self) -> Result<Vec<Document>> {
        self.documents_tree
            .iter()
            .values()
            .map(|value| {
                let bytes = value.map_err(|e| {
                    AppError::Database(format!("Failed to scan documents: {}", e))
                })?;
                Self::deserialize_document(&bytes)
            })
            .collect()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Internal(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for SledStore {
    fn backend_name(&self) -> &'static str {
        "sled"
    }

    async fn ping(&self) -> Result<()> {
        self.documents_tree.contains_key(b"").map_err(|e| {
            AppError::StoreUnavailable(format!("Sled store is not readable: {}", e))
        })?;
        Ok(())
    }

    async fn insert(&self, mut document: Document) -> Result<String> {
        let id = assign_id(&mut document);
        let seq = self.db.generate_id().map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to allocate document key: {}", e))
        })?;
        let key = seq.to_be_bytes();
        let value = Self::serialize_document(&document)?;

        self.documents_tree.insert(key, value).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to insert document: {}", e))
        })?;

        self.ids_tree.insert(id.as_bytes(), key.to_vec()).map_err(|e| {
            AppError::Database(format!("Failed to index document: {}", e))
        })?;

        // Flush to ensure durability
        self.documents_tree.flush().map_err(|e| {
            AppError::Internal(format!("Failed to flush documents tree: {}", e))
        })?;

        tracing::debug!(document_id = %id, "Document saved to Sled");
        Ok(id)
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>> {
        Ok(query.apply(self.scan()?))
    }

    async fn count(&self, filter: &ReadingFilter) -> Result<u64> {
        if *filter == ReadingFilter::default() {
            return Ok(self.documents_tree.len() as u64);
        }

        let count = self.scan()?.iter().filter(|doc| filter.matches(doc)).count();
        Ok(count as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Err(AppError::Validation("Document id cannot be empty".to_string()));
        }

        let key = match self.ids_tree.remove(id.as_bytes()).map_err(|e| {
            AppError::Database(format!("Failed to read id index: {}", e))
        })? {
            Some(key) => key,
            None => return Ok(false),
        };

        self.documents_tree.remove(key).map_err(|e| {
            AppError::Database(format!("Failed to delete document: {}", e))
        })?;

        self.documents_tree.flush().map_err(|e| {
            AppError::Internal(format!("Failed to flush documents tree: {}", e))
        })?;

        tracing::debug!(document_id = %id, "Document deleted from Sled");
        Ok(true)
    }
}
