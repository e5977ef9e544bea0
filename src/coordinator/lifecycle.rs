//! Service lifecycle: connect, start, background reconciliation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::CatalogSearchConfig;
use crate::storage::redis::RediSearchBackend;
use crate::storage::sql::SqlProductSource;
use crate::storage::traits::StorageError;

use super::{CatalogSearch, IndexStatus};

impl CatalogSearch {
    /// Connect to Redis Stack and the catalog database named in `config`.
    ///
    /// Both connections use startup retry and fail fast on a bad URL.
    pub async fn connect(config: CatalogSearchConfig) -> Result<Self, StorageError> {
        let (search_url, sql_url) = config
            .backend_urls()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        info!(url = %search_url, "Connecting to search engine...");
        let backend = RediSearchBackend::connect(search_url).await.map_err(|e| {
            error!(error = %e, "Failed to connect to search engine");
            e
        })?;

        info!("Connecting to catalog database...");
        let source = SqlProductSource::connect(sql_url).await.map_err(|e| {
            error!(error = %e, "Failed to connect to catalog database");
            e
        })?;

        let search = Self::new(config, Arc::new(backend), Arc::new(source));
        info!(index = %search.index.index_name(), "Backends connected");
        Ok(search)
    }

    /// Prepare the index for serving.
    ///
    /// An index that cannot be ensured leaves the service up in
    /// [`IndexStatus::Degraded`]: listings come back empty until the engine
    /// recovers. With `resync_on_start` a full resync follows; its failures
    /// are logged only.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> IndexStatus {
        let started = std::time::Instant::now();

        if let Err(e) = self.ensure_index().await {
            error!(error = %e, "Search index unavailable, serving degraded listings");
            crate::metrics::set_index_ready(false);
            return IndexStatus::Degraded;
        }
        crate::metrics::set_index_ready(true);

        if self.config.resync_on_start {
            match self.resync_all().await {
                Ok(report) if !report.is_success() => {
                    warn!(failed = report.failures.len(), "Startup resync left documents unindexed");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Startup resync failed"),
            }
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Catalog search ready");
        IndexStatus::Ready
    }

    /// Run [`reconcile()`](Self::reconcile) every `reconcile_interval_secs`
    /// until `shutdown` flips or its sender is dropped.
    ///
    /// Returns `None` when the interval is 0.
    pub fn spawn_reconciler(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        let secs = self.config.reconcile_interval_secs;
        if secs == 0 {
            return None;
        }

        info!(interval_secs = secs, "Starting reconciler");
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reconcile().await {
                            warn!(error = %e, "Reconcile failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("Reconciler stopped");
                        break;
                    }
                }
            }
        }))
    }
}
