use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::filter::FilterData;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The document changed since it was read, or the id/unique key is taken.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A document as held by the store, with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub version: i64,
    pub body: Value,
}

/// Schemaless document persistence keyed by `(collection, id)`.
///
/// Single reads and single writes are atomic. `replace` is conditional on the
/// version that was read, which lets callers detect concurrent modification.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError>;

    /// First matching document in insertion order.
    async fn find_one(&self, collection: &str, filter: &FilterData) -> Result<Option<StoredDocument>, StoreError>;

    /// All matching documents in insertion order.
    async fn find_all(&self, collection: &str, filter: &FilterData) -> Result<Vec<StoredDocument>, StoreError>;

    /// Insert a new document at version 1. Fails with `Conflict` if the id exists.
    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<StoredDocument, StoreError>;

    /// Replace the document body if its version still equals `expected_version`.
    ///
    /// Fails with `NotFound` if the document is gone and `Conflict` if it was
    /// modified in between.
    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<StoredDocument, StoreError>;

    /// Returns whether a document was removed.
    async fn remove(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Returns how many documents were removed.
    async fn remove_where(&self, collection: &str, filter: &FilterData) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
