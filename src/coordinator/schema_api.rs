// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index schema management.

use tracing::{debug, error, info};

use crate::storage::traits::StorageError;

use super::{CatalogSearch, IndexOutcome};

impl CatalogSearch {
    /// Make sure the product index exists, creating it if needed.
    ///
    /// Idempotent. An existing index is never dropped or altered, even when
    /// its mapping differs from the declared one.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use catalog_search::{CatalogSearch, IndexOutcome};
    /// # async fn example(search: &CatalogSearch) {
    /// match search.ensure_index().await {
    ///     Ok(IndexOutcome::Created) => println!("index created"),
    ///     Ok(IndexOutcome::AlreadyExists) => {}
    ///     Err(e) => eprintln!("search unavailable: {e}"),
    /// }
    /// # }
    /// ```
    #[tracing::instrument(skip(self), fields(index = %self.index.index_name()))]
    pub async fn ensure_index(&self) -> Result<IndexOutcome, StorageError> {
        let exists = self.backend.index_exists(&self.index).await.map_err(|e| {
            error!(error = %e, "Failed to check search index");
            crate::metrics::record_index_operation("exists", false);
            e
        })?;

        if exists {
            debug!("Search index already exists");
            crate::metrics::record_index_operation("exists", true);
            return Ok(IndexOutcome::AlreadyExists);
        }

        match self.backend.create_index(&self.index).await {
            Ok(()) => {
                info!(
                    prefix = %self.index.prefix,
                    fields = self.index.fields.len(),
                    "Search index created"
                );
                crate::metrics::record_index_operation("create", true);
                Ok(IndexOutcome::Created)
            }
            Err(e) => {
                error!(error = %e, "Failed to create search index");
                crate::metrics::record_index_operation("create", false);
                Err(e)
            }
        }
    }
}
