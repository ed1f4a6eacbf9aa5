//! Document store abstraction.
//!
//! Profiles and notes live in an external document database addressed by
//! collection name and document id. The `DocumentStore` trait is the narrow
//! contract the services depend on; adapters implement it for a local SQLite
//! file and for Firestore's REST API.

mod firestore;
mod sqlite;

pub use firestore::FirestoreStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::{StoreBackend, StoreConfig};

/// Top-level fields of a document.
pub type Document = Map<String, Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Store unreachable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Store misconfigured: {0}")]
    Config(String),
}

/// Operations the services need from the document database.
///
/// No operation is transactional: a read followed by a write can interleave
/// with other writers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name, used in logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// Fetch a document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document.
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// Fails with `NotFound` and writes nothing when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: &Document)
        -> Result<(), StoreError>;

    /// Insert a document under a store-assigned id and return that id.
    async fn add(&self, collection: &str, doc: &Document) -> Result<String, StoreError>;

    /// All documents whose `field` equals `value`, in store-native order.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Build the store selected by configuration.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.sqlite_path)?)),
        StoreBackend::Firestore => {
            let firestore = config.firestore.as_ref().ok_or_else(|| {
                StoreError::Config("store.firestore section is required".to_string())
            })?;
            Ok(Arc::new(FirestoreStore::new(firestore)))
        }
    }
}
