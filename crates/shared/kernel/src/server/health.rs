use axum::http::header;
use axum::{Json, response::IntoResponse};
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;
use utoipa::ToSchema;
use wm_domain::constants::SYSTEM_TAG;

/// Liveness report for the mirror process.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    /// Always "up" while the process answers.
    status: &'static str,
    /// Workspace version baked in at compile time.
    version: &'static str,
    /// Seconds since the first probe.
    uptime: u64,
}

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

#[utoipa::path(
    get,
    path = "/health",
    responses((status = OK, description = "Healthcheck endpoint", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler() -> impl IntoResponse {
    let report = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: STARTED.elapsed().as_secs(),
    };

    // Probes must always see a fresh answer.
    let no_cache = [
        (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        (header::PRAGMA, "no-cache"),
    ];

    (no_cache, Json(report))
}
