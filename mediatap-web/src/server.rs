//! HTTP server assembly: app state, router, and the serve loop.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use mediatap_core::MediatapConfig;
use mediatap_core::extractor::{MediaExtractor, extractor_from_config};
use mediatap_core::ledger::{FileLedger, PaymentLedger};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::{download, media, payments};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn MediaExtractor>,
    pub ledger: Arc<dyn PaymentLedger>,
    pub config: MediatapConfig,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        ledger: Arc<dyn PaymentLedger>,
        config: MediatapConfig,
    ) -> Self {
        Self {
            extractor,
            ledger,
            config,
            started_at: std::time::Instant::now(),
        }
    }
}

/// Builds the full API router over the given state.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        .route("/api/health", get(media::health))
        .route("/api/metadata", post(media::metadata))
        .route("/api/download-link", post(media::download_link))
        .route("/api/playlist-videos", post(media::playlist_videos))
        .route("/api/download-proxy", post(download::download_proxy))
        .route("/api/download-playlist", post(download::download_playlist))
        .route("/api/payments/verify", post(payments::verify_payment))
        .route(
            "/api/payments/{transaction_id}/status",
            get(payments::payment_status),
        )
        .route(
            "/api/admin/payments/pending",
            get(payments::pending_payments),
        )
        .route(
            "/api/admin/payments/approve",
            post(payments::approve_payment),
        )
        .route("/api/admin/payments/reject", post(payments::reject_payment))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Builds state from configuration and serves until shutdown.
pub async fn run_server(config: MediatapConfig) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = extractor_from_config(&config.extractor);
    let ledger: Arc<dyn PaymentLedger> =
        Arc::new(FileLedger::new(config.ledger.directory.clone()));

    info!(
        backend = extractor.name(),
        listen = %config.server.listen_addr,
        "Starting Mediatap server"
    );

    let listen_addr = config.server.listen_addr.clone();
    let app = build_router(AppState::new(extractor, ledger, config));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Listening on http://{listen_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
