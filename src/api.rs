//! HTTP surface: `GET /products` and `GET /health`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::coordinator::{CatalogSearch, Pagination};
use crate::product::ProductRecord;
use crate::search::ProductListParams;

/// Set to `true` on listings built from a failed search.
pub const DEGRADED_HEADER: HeaderName = HeaderName::from_static("x-search-degraded");

#[derive(Serialize)]
struct ProductsEnvelope {
    success: bool,
    message: &'static str,
    data: Vec<ProductRecord>,
    pagination: Pagination,
}

pub fn router(search: Arc<CatalogSearch>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([DEGRADED_HEADER])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/products", get(products_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(search)
}

/// Listing never errors: a malformed query string is treated as empty.
async fn products_handler(
    State(search): State<Arc<CatalogSearch>>,
    params: Option<Query<ProductListParams>>,
) -> Response {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let page = search.list_products(&params).await;

    let body = ProductsEnvelope {
        success: true,
        message: "Products fetched successfully",
        data: page.data,
        pagination: page.pagination,
    };

    let mut response = Json(body).into_response();
    if page.degraded {
        response
            .headers_mut()
            .insert(DEGRADED_HEADER, HeaderValue::from_static("true"));
    }
    response
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Bind `address` and serve until Ctrl+C or SIGTERM.
pub async fn serve(search: Arc<CatalogSearch>, address: &str) -> std::io::Result<()> {
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(search))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
