use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::aggregator::{LastReport, Report};
use crate::metrics::{Recorder, Summary};

/// The exporter listens on a fixed port, independent of the target URL.
pub const METRICS_ADDR: &str = "0.0.0.0:8080";

/// State shared with the exporter handlers.
pub struct ExporterState {
    pub registry: Registry,
    pub recorder: Arc<Recorder>,
    pub last_report: LastReport,
}

/// Payload of `GET /stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// The most recent periodic report, absent until the first non-empty
    /// period has been flushed.
    pub last_report: Option<Report>,
    /// Lifetime totals across every period so far.
    pub summary: Summary,
}

/// Builds the exporter router: prometheus text exposition at `/metrics`,
/// a JSON snapshot at `/stats`.
pub fn router(state: Arc<ExporterState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/stats", get(stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds and serves until the process exits. Callers treat any error
/// from here as fatal.
pub async fn serve(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "metrics exporter listening");
    axum::serve(listener, app).await
}

// ─── GET /metrics ────────────────────────────────────────────────

async fn metrics(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type())],
            buffer,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

// ─── GET /stats ──────────────────────────────────────────────────

async fn stats(State(state): State<Arc<ExporterState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        last_report: *state.last_report.lock(),
        summary: state.recorder.snapshot(),
    })
}
