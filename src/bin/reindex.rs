//! Offline index maintenance.
//!
//! ```sh
//! SEARCH_URL=redis://localhost:6379 DATABASE_URL=sqlite:shop.db reindex
//! reindex --prune          # also delete documents of removed products
//! reindex --ensure-only    # create the index and exit
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use catalog_search::{CatalogSearch, CatalogSearchConfig};

#[derive(Parser)]
#[command(
    name = "reindex",
    about = "Rebuild the product search index from the catalog database",
    version
)]
struct Cli {
    /// Also delete index documents whose product no longer exists
    #[arg(long)]
    prune: bool,

    /// Only create the index if missing; do not copy documents
    #[arg(long, conflicts_with = "prune")]
    ensure_only: bool,

    /// Documents per bulk write (overrides BULK_CHUNK_SIZE)
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = match CatalogSearchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(size) = cli.chunk_size {
        config.bulk_chunk_size = size.max(1);
    }

    let search = match CatalogSearch::connect(config).await {
        Ok(search) => search,
        Err(e) => {
            error!(error = %e, "Failed to connect");
            return ExitCode::FAILURE;
        }
    };

    match search.ensure_index().await {
        Ok(outcome) => info!(?outcome, "Index ensured"),
        Err(e) => {
            error!(error = %e, "Failed to ensure index");
            return ExitCode::FAILURE;
        }
    }
    if cli.ensure_only {
        return ExitCode::SUCCESS;
    }

    let failed = if cli.prune {
        match search.reconcile().await {
            Ok(report) => {
                info!(
                    indexed = report.resync.indexed,
                    total = report.resync.total,
                    pruned = report.pruned.len(),
                    "Reindex finished"
                );
                report.resync.failures.len() + report.prune_failures.len()
            }
            Err(e) => {
                error!(error = %e, "Reindex aborted");
                return ExitCode::FAILURE;
            }
        }
    } else {
        match search.resync_all().await {
            Ok(report) => {
                info!(indexed = report.indexed, total = report.total, "Reindex finished");
                report.failures.len()
            }
            Err(e) => {
                error!(error = %e, "Reindex aborted");
                return ExitCode::FAILURE;
            }
        }
    };

    if failed > 0 {
        warn!(failed, "Some documents were not indexed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
