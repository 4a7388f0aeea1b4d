//! HTTP service
//!
//! A small web front end: a form that starts a crawl in the background, a status
//! page polling the run's log, and a zip download of the saved images.
//!
//! # Routes
//!
//! - `GET /` - Crawl form
//! - `POST /` - Start a crawl, redirect to its status page
//! - `GET /status/:run` - Auto-refreshing status page
//! - `GET /status/:run/messages` - Status log as JSON
//! - `POST /status/:run/cancel` - Cancel a running crawl
//! - `GET /files/:run/:name` - A saved image
//! - `GET /download/:run` - Zip of the run's images
//! - `GET /health` - Health check

mod error;
mod pages;
mod routes;
mod state;

pub use error::ServerError;
pub use routes::CrawlForm;
pub use state::{AppState, RunHandle, RunRegistry};

use crate::config::Config;
use crate::CrawlerError;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the router with all route definitions
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index).post(routes::start_crawl))
        .route("/status/:run", get(routes::status_page))
        .route("/status/:run/messages", get(routes::status_messages))
        .route("/status/:run/cancel", post(routes::cancel_run))
        .route("/files/:run/:name", get(routes::saved_file))
        .route("/download/:run", get(routes::download_archive))
        .route("/health", get(routes::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C
///
/// # Errors
///
/// Returns an error if the download root cannot be created or the address
/// cannot be bound.
pub async fn serve(config: Config) -> Result<(), CrawlerError> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| CrawlerError::InvalidRequest(format!("invalid bind address: {}", e)))?;

    let root = std::path::PathBuf::from(&config.server.download_root);
    tokio::fs::create_dir_all(&root)
        .await
        .map_err(|source| CrawlerError::Filesystem { path: root, source })?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let app = create_router(AppState::new(config));
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
