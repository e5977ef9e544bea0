// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for catalog search.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The hosting binary is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `catalog_search_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: search, count, hydrate, index_one, remove_one
//! - `status`: success, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a search-side query (search or count)
pub fn record_search_query(operation: &str, status: &str) {
    counter!(
        "catalog_search_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record query latency
pub fn record_search_latency(operation: &str, duration: Duration) {
    histogram!(
        "catalog_search_query_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record number of ids a search returned
pub fn record_search_results(count: usize) {
    histogram!("catalog_search_results").record(count as f64);
}

/// Record rows requested vs found during hydration
pub fn record_hydration(requested: usize, found: usize) {
    histogram!("catalog_search_hydrated_rows").record(found as f64);
    if found < requested {
        counter!("catalog_search_stale_hits_total").increment((requested - found) as u64);
    }
}

/// Record a single-document sync operation
pub fn record_sync_operation(operation: &str, status: &str) {
    counter!(
        "catalog_search_sync_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the outcome of a full resync
pub fn record_resync(indexed: usize, failed: usize, duration: Duration) {
    counter!("catalog_search_resync_documents_total", "status" => "indexed").increment(indexed as u64);
    counter!("catalog_search_resync_documents_total", "status" => "failed").increment(failed as u64);
    histogram!("catalog_search_resync_seconds").record(duration.as_secs_f64());
    gauge!("catalog_search_last_resync_failures").set(failed as f64);
}

/// Record orphan documents removed by reconciliation
pub fn record_reconcile_pruned(count: usize) {
    counter!("catalog_search_reconcile_pruned_total").increment(count as u64);
}

/// Record an index lifecycle operation
pub fn record_index_operation(operation: &str, success: bool) {
    counter!(
        "catalog_search_index_operations_total",
        "operation" => operation.to_string(),
        "status" => if success { "success" } else { "error" }
    )
    .increment(1);
}

/// Record a listing served from a failed search
pub fn record_degraded_response(reason: &str) {
    counter!(
        "catalog_search_degraded_responses_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Set whether the search index is usable (1) or not (0)
pub fn set_index_ready(ready: bool) {
    gauge!("catalog_search_index_ready").set(if ready { 1.0 } else { 0.0 });
}

/// Records query latency on drop.
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_search_latency(self.operation, self.start.elapsed());
    }
}
