use async_trait::async_trait;
use thiserror::Error;

use crate::product::{IndexDocument, ProductRecord, ProjectionError};
use crate::search::{Query, SearchIndex, SortKey, Window};

#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend unreachable; bulk operations abort on this.
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Search index '{0}' does not exist")]
    IndexMissing(String),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl StorageError {
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// A document a bulk write could not store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub id: i64,
    pub reason: String,
}

/// Outcome of a bulk write: per-document, never all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteResult {
    pub written: Vec<i64>,
    pub failures: Vec<DocumentFailure>,
}

/// Hosted full-text index holding [`IndexDocument`]s.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn index_exists(&self, index: &SearchIndex) -> Result<bool, StorageError>;

    /// Create the index. An "already exists" answer is success.
    async fn create_index(&self, index: &SearchIndex) -> Result<(), StorageError>;

    /// Insert or fully replace the document with `doc.id`.
    async fn upsert(&self, index: &SearchIndex, doc: &IndexDocument) -> Result<(), StorageError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, index: &SearchIndex, id: i64) -> Result<(), StorageError>;

    /// Upsert many documents, reporting failures per document.
    /// Default implementation falls back to sequential upserts and
    /// aborts only on connection loss.
    async fn upsert_batch(
        &self,
        index: &SearchIndex,
        docs: &[IndexDocument],
    ) -> Result<BulkWriteResult, StorageError> {
        let mut result = BulkWriteResult::default();
        for doc in docs {
            match self.upsert(index, doc).await {
                Ok(()) => result.written.push(doc.id),
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => result.failures.push(DocumentFailure {
                    id: doc.id,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(result)
    }

    /// Ordered ids of matching documents inside `window`.
    /// An open window is capped at `cap`.
    async fn search_ids(
        &self,
        index: &SearchIndex,
        query: &Query,
        sort: SortKey,
        window: Window,
        cap: usize,
    ) -> Result<Vec<i64>, StorageError>;

    /// Total matches, ignoring window and sort.
    async fn count(&self, index: &SearchIndex, query: &Query) -> Result<u64, StorageError>;

    /// Every document id under the index prefix.
    async fn list_ids(&self, index: &SearchIndex) -> Result<Vec<i64>, StorageError>;
}

/// Catalog database, the source of record. Read-only here.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StorageError>;

    /// Rows for `ids` in no particular order; unknown ids are skipped.
    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<ProductRecord>, StorageError>;

    async fn fetch_one(&self, id: i64) -> Result<Option<ProductRecord>, StorageError> {
        Ok(self.fetch_by_ids(&[id]).await?.into_iter().next())
    }
}
