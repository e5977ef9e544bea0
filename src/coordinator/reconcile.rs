//! Drift repair between the catalog and the index.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::storage::traits::{DocumentFailure, StorageError};

use super::{CatalogSearch, ReconcileReport};

impl CatalogSearch {
    /// Resync every product, then delete index documents whose product is
    /// no longer in the catalog.
    ///
    /// The catalog listing is read once and used for both steps. Prune
    /// candidates are checked against the catalog again before deletion so a
    /// product created after that read keeps its document.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport, StorageError> {
        let start = Instant::now();
        let records = self.source.fetch_all().await?;
        let resync = self.sync_records(&records, start).await?;

        let live: HashSet<i64> = records.iter().map(|r| r.id).collect();
        let mut orphans: Vec<i64> = self
            .backend
            .list_ids(&self.index)
            .await?
            .into_iter()
            .filter(|id| !live.contains(id))
            .collect();
        if !orphans.is_empty() {
            let created: HashSet<i64> = self
                .source
                .fetch_by_ids(&orphans)
                .await?
                .iter()
                .map(|r| r.id)
                .collect();
            if !created.is_empty() {
                debug!(count = created.len(), "Keeping documents of products created during reconcile");
                orphans.retain(|id| !created.contains(id));
            }
        }

        let mut pruned = Vec::with_capacity(orphans.len());
        let mut prune_failures = Vec::new();
        for id in orphans {
            match self.backend.delete(&self.index, id).await {
                Ok(()) => pruned.push(id),
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => {
                    warn!(id, error = %e, "Failed to prune orphan document");
                    prune_failures.push(DocumentFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        crate::metrics::record_reconcile_pruned(pruned.len());
        info!(
            indexed = resync.indexed,
            pruned = pruned.len(),
            failed = resync.failures.len() + prune_failures.len(),
            "Reconcile complete"
        );

        Ok(ReconcileReport {
            resync,
            pruned,
            prune_failures,
        })
    }
}
