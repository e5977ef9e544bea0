//! Public types for the catalog search coordinator.

use std::time::Duration;

use serde::Serialize;

use crate::product::ProductRecord;
use crate::storage::traits::DocumentFailure;

/// Result of [`super::CatalogSearch::ensure_index()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The index was created by this call
    Created,
    /// The index was already there; its mapping was left alone
    AlreadyExists,
}

/// Search availability after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Index exists and queries can be served
    Ready,
    /// Index could not be ensured; listings fail soft
    Degraded,
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Aggregate outcome of a full resync.
#[derive(Debug, Clone, PartialEq)]
pub struct ResyncReport {
    /// Records read from the catalog
    pub total: usize,
    /// Documents written to the index
    pub indexed: usize,
    /// Documents that could not be written, with the reason
    pub failures: Vec<DocumentFailure>,
    pub elapsed: Duration,
}

impl ResyncReport {
    #[must_use]
    pub fn empty(elapsed: Duration) -> Self {
        Self {
            total: 0,
            indexed: 0,
            failures: Vec::new(),
            elapsed,
        }
    }

    /// Check if every document was indexed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resync plus removal of documents whose product no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub resync: ResyncReport,
    pub pruned: Vec<i64>,
    pub prune_failures: Vec<DocumentFailure>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.resync.is_success() && self.prune_failures.is_empty()
    }
}

/// Pagination block of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(page: usize, limit: usize, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64)
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: (page as u64) < total_pages,
        }
    }
}

/// One page of products in search order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub data: Vec<ProductRecord>,
    pub pagination: Pagination,
    /// Set when some part of the listing failed and was softened
    pub degraded: bool,
}

impl ProductPage {
    /// Empty page served when search or hydration failed.
    #[must_use]
    pub fn degraded(page: usize, limit: usize) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::new(page, limit, 0),
            degraded: true,
        }
    }
}
