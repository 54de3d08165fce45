//! HTTP server exposing the current perception state.
//!
//! This module provides an HTTP server that:
//! - Reports liveness via GET /health
//! - Serves the current flattened state via GET /api/state
//! - Pushes the current state to the reporting endpoint via POST /api/send
//!
//! # Architecture
//!
//! ```text
//! Frame source ──→ pipeline ──→ SharedState ──→ GET /api/state
//!                                    │
//!                                    └──→ POST /api/send ──→ remote endpoint
//! ```

use crate::core::{Report, SharedState};
use crate::reporter::{ReporterClient, ReporterConfig};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Endpoint receiving pushed reports
    pub report_url: String,
}

impl ServerConfig {
    pub fn new(port: u16, report_url: impl Into<String>) -> Self {
        Self {
            port,
            report_url: report_url.into(),
        }
    }
}

/// Shared server state
pub struct ServerState {
    /// Published classifier outputs
    shared: Arc<SharedState>,
    /// Client for on-demand pushes
    reporter: Mutex<ReporterClient>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response from the on-demand send endpoint
#[derive(Serialize)]
pub struct SendResponse {
    pub status: String,
    pub report: Report,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/state
///
/// Flattens the current snapshot into the same shape the reporter pushes.
async fn current_state(State(state): State<Arc<ServerState>>) -> Json<Report> {
    let source = state.reporter.lock().await.device_id().to_string();
    Json(state.shared.snapshot().to_report(&source))
}

/// POST /api/send
///
/// Pushes the current state to the configured reporting endpoint immediately,
/// regardless of the periodic cadence or change skipping.
async fn send(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut reporter = state.reporter.lock().await;
    let report = state.shared.snapshot().to_report(reporter.device_id());

    reporter.force_send(report.clone()).await.map_err(|e| {
        tracing::error!("Failed to push report: {e}");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("Report push failed: {e}"),
                code: "REPORT_ERROR".to_string(),
            }),
        )
    })?;

    Ok(Json(SendResponse {
        status: "ok".to_string(),
        report,
    }))
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    shared: Arc<SharedState>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let reporter = ReporterClient::new(ReporterConfig::new(&config.report_url))?;
    let state = Arc::new(ServerState {
        shared,
        reporter: Mutex::new(reporter),
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/state", get(current_state))
        .route("/api/send", post(send))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Presence sensor server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
