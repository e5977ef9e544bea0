// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API: query translation, hydration and paginated listing.
//!
//! `search` and `count` are soft-failing: any search-engine error is logged
//! and turned into an empty result. `try_search`/`try_count` expose the
//! error for callers that want to signal degradation.
//!
//! # Example
//!
//! ```rust,no_run
//! # use catalog_search::{CatalogSearch, SearchQuery, SortKey, Window};
//! # async fn example(search: &CatalogSearch) {
//! let query = SearchQuery {
//!     keyword: Some("laptop".into()),
//!     min_price: Some(40_000_000.0),
//!     sort: SortKey::PriceAsc,
//!     window: Window::page(1, 12),
//!     ..Default::default()
//! };
//!
//! let ids = search.search(&query).await;
//! let products = search.hydrate(&ids).await.unwrap_or_default();
//! # }
//! ```

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::metrics::LatencyTimer;
use crate::product::ProductRecord;
use crate::search::{ProductListParams, SearchQuery, Window};
use crate::storage::traits::StorageError;

use super::{CatalogSearch, Pagination, ProductPage};

impl CatalogSearch {
    /// Ordered product ids matching `query`, or empty on any search failure.
    pub async fn search(&self, query: &SearchQuery) -> Vec<i64> {
        self.try_search(query).await.unwrap_or_default()
    }

    /// Total matches for `query`, or 0 on any search failure.
    pub async fn count(&self, query: &SearchQuery) -> u64 {
        self.try_count(query).await.unwrap_or(0)
    }

    /// Like [`search`](Self::search) but returns the error.
    pub async fn try_search(&self, query: &SearchQuery) -> Result<Vec<i64>, StorageError> {
        let _timer = LatencyTimer::new("search");
        let result = self
            .backend
            .search_ids(
                &self.index,
                &query.to_query(),
                query.sort,
                query.window,
                self.config.unbounded_window,
            )
            .await;

        match &result {
            Ok(ids) => {
                debug!(hits = ids.len(), sort = ?query.sort, "Search completed");
                crate::metrics::record_search_query("search", "success");
                crate::metrics::record_search_results(ids.len());
            }
            Err(e) => {
                warn!(error = %e, "Search failed, returning no results");
                crate::metrics::record_search_query("search", "error");
            }
        }
        result
    }

    /// Like [`count`](Self::count) but returns the error.
    pub async fn try_count(&self, query: &SearchQuery) -> Result<u64, StorageError> {
        let _timer = LatencyTimer::new("count");
        let result = self.backend.count(&self.index, &query.to_query()).await;

        match &result {
            Ok(_) => crate::metrics::record_search_query("count", "success"),
            Err(e) => {
                warn!(error = %e, "Count failed, returning zero");
                crate::metrics::record_search_query("count", "error");
            }
        }
        result
    }

    /// Load full catalog rows for `ids`, preserving their order.
    ///
    /// Ids with no catalog row (deleted since they were indexed) are
    /// dropped; duplicates keep their first position.
    pub async fn hydrate(&self, ids: &[i64]) -> Result<Vec<ProductRecord>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let _timer = LatencyTimer::new("hydrate");
        let rows = self.source.fetch_by_ids(ids).await?;
        let ordered = reorder(ids, rows);
        crate::metrics::record_hydration(ids.len(), ordered.len());
        if ordered.len() < ids.len() {
            debug!(
                requested = ids.len(),
                found = ordered.len(),
                "Dropped index hits with no catalog row"
            );
        }
        Ok(ordered)
    }

    /// One page of products for the `GET /products` listing.
    ///
    /// Never fails. If search or hydration fails the page is empty; if only
    /// the count fails the total is estimated from the window. Either way
    /// [`ProductPage::degraded`] is set.
    pub async fn list_products(&self, params: &ProductListParams) -> ProductPage {
        let page = params.page();
        let limit = params.limit(self.config.default_page_limit, self.config.max_page_limit);
        let query = params.to_search_query(Window::page(page, limit));

        let ids = match self.try_search(&query).await {
            Ok(ids) => ids,
            Err(_) => {
                crate::metrics::record_degraded_response("search");
                return ProductPage::degraded(page, limit);
            }
        };

        let data = match self.hydrate(&ids).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Hydration failed, returning empty page");
                crate::metrics::record_degraded_response("hydrate");
                return ProductPage::degraded(page, limit);
            }
        };

        let (total, degraded) = match self.try_count(&query).await {
            Ok(total) => (total, false),
            Err(_) => {
                crate::metrics::record_degraded_response("count");
                ((query.window.offset + data.len()) as u64, true)
            }
        };

        ProductPage {
            data,
            pagination: Pagination::new(page, limit, total),
            degraded,
        }
    }
}

fn reorder(ids: &[i64], rows: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut by_id: HashMap<i64, ProductRecord> = rows.into_iter().map(|r| (r.id, r)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
