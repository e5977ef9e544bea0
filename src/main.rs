use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use catalog_search::api;
use catalog_search::{CatalogSearch, CatalogSearchConfig};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = match CatalogSearchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let listen_addr = config.listen_addr.clone();

    info!("Initializing catalog search...");
    let search = match CatalogSearch::connect(config).await {
        Ok(search) => Arc::new(search),
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let status = search.start().await;
    info!(%status, "Search index status");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = search.clone().spawn_reconciler(shutdown_rx);

    info!("Starting server...");
    let served = api::serve(search, &listen_addr).await;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = reconciler {
        let _ = handle.await;
    }

    match served {
        Ok(()) => {
            info!("Server shut down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, address = %listen_addr, "Server failed");
            ExitCode::FAILURE
        }
    }
}
