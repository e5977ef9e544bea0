//! Index writes: single-document upsert/removal and full resync.
//!
//! Single-document writes never fail the caller. A product save in the
//! catalog must succeed whether or not the search engine is reachable; drift
//! is repaired by the next resync or reconcile.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::product::{IndexDocument, ProductRecord};
use crate::storage::traits::{DocumentFailure, StorageError};

use super::{CatalogSearch, ResyncReport};

impl CatalogSearch {
    /// Write one product into the index, replacing any existing document.
    ///
    /// Returns whether the document was written. Errors are logged and
    /// counted, never returned.
    pub async fn index_one(&self, record: &ProductRecord) -> bool {
        let result = match IndexDocument::try_from(record) {
            Ok(doc) => self.backend.upsert(&self.index, &doc).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                debug!(id = record.id, "Product indexed");
                crate::metrics::record_sync_operation("index_one", "success");
                true
            }
            Err(e) => {
                warn!(id = record.id, error = %e, "Failed to index product");
                crate::metrics::record_sync_operation("index_one", "error");
                false
            }
        }
    }

    /// Drop one product's document. Removing an absent document succeeds.
    pub async fn remove_one(&self, id: i64) -> bool {
        match self.backend.delete(&self.index, id).await {
            Ok(()) => {
                debug!(id, "Product removed from index");
                crate::metrics::record_sync_operation("remove_one", "success");
                true
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to remove product from index");
                crate::metrics::record_sync_operation("remove_one", "error");
                false
            }
        }
    }

    /// Re-index every catalog product.
    ///
    /// Documents are written in chunks of `bulk_chunk_size`. A bad record or
    /// a rejected document is reported in [`ResyncReport::failures`] and does
    /// not stop the run; a lost connection to either backend does.
    ///
    /// Documents for products that no longer exist are left alone; see
    /// [`CatalogSearch::reconcile()`].
    #[tracing::instrument(skip(self))]
    pub async fn resync_all(&self) -> Result<ResyncReport, StorageError> {
        let start = Instant::now();
        let records = self.source.fetch_all().await.map_err(|e| {
            error!(error = %e, "Failed to read catalog for resync");
            e
        })?;
        self.sync_records(&records, start).await
    }

    pub(super) async fn sync_records(
        &self,
        records: &[ProductRecord],
        start: Instant,
    ) -> Result<ResyncReport, StorageError> {
        if records.is_empty() {
            info!("No products to sync");
            return Ok(ResyncReport::empty(start.elapsed()));
        }

        let mut failures = Vec::new();
        let mut docs = Vec::with_capacity(records.len());
        for record in records {
            match IndexDocument::try_from(record) {
                Ok(doc) => docs.push(doc),
                Err(e) => failures.push(DocumentFailure {
                    id: record.id,
                    reason: e.to_string(),
                }),
            }
        }

        let mut indexed = 0;
        for chunk in docs.chunks(self.config.bulk_chunk_size.max(1)) {
            let result = self.backend.upsert_batch(&self.index, chunk).await.map_err(|e| {
                error!(error = %e, indexed, "Resync aborted");
                e
            })?;
            indexed += result.written.len();
            failures.extend(result.failures);
        }

        for failure in &failures {
            warn!(id = failure.id, reason = %failure.reason, "Product not indexed");
        }

        let report = ResyncReport {
            total: records.len(),
            indexed,
            failures,
            elapsed: start.elapsed(),
        };
        crate::metrics::record_resync(report.indexed, report.failures.len(), report.elapsed);
        info!(
            total = report.total,
            indexed = report.indexed,
            failed = report.failures.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Resync complete"
        );
        Ok(report)
    }
}
