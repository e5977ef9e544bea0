// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Catalog search coordinator.
//!
//! [`CatalogSearch`] ties the search index to the catalog database:
//! - schema: idempotent index creation
//! - sync: single-document upserts/removals and full resync
//! - search: soft-failing search and count, hydration, paginated listing
//! - reconcile: resync plus pruning of orphan documents
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use catalog_search::{CatalogSearch, CatalogSearchConfig, ProductListParams};
//! use catalog_search::storage::memory::{InMemoryCatalog, InMemorySearchIndex};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let search = CatalogSearch::new(
//!     CatalogSearchConfig::default(),
//!     Arc::new(InMemorySearchIndex::new()),
//!     Arc::new(InMemoryCatalog::new()),
//! );
//!
//! search.ensure_index().await.unwrap();
//! let page = search.list_products(&ProductListParams::default()).await;
//! assert!(page.data.is_empty());
//! assert!(!page.degraded);
//! # }
//! ```

mod lifecycle;
mod reconcile;
mod schema_api;
mod search_api;
mod sync_api;
mod types;

pub use types::{
    IndexOutcome, IndexStatus, Pagination, ProductPage, ReconcileReport, ResyncReport,
};

use std::sync::Arc;

use crate::config::CatalogSearchConfig;
use crate::search::{product_index, SearchIndex};
use crate::storage::traits::{ProductSource, SearchBackend};

/// Keeps the product index consistent with the catalog and answers listings.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct CatalogSearch {
    pub(super) config: CatalogSearchConfig,
    pub(super) index: SearchIndex,
    pub(super) backend: Arc<dyn SearchBackend>,
    pub(super) source: Arc<dyn ProductSource>,
}

impl CatalogSearch {
    pub fn new(
        config: CatalogSearchConfig,
        backend: Arc<dyn SearchBackend>,
        source: Arc<dyn ProductSource>,
    ) -> Self {
        let index = product_index(config.index_name.clone(), config.key_prefix.clone());
        Self {
            config,
            index,
            backend,
            source,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CatalogSearchConfig {
        &self.config
    }

    /// The declared index mapping.
    #[must_use]
    pub fn index(&self) -> &SearchIndex {
        &self.index
    }
}
