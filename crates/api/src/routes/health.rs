use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the image backend is reachable.
    pub gateway_healthy: bool,
}

/// GET /health -- returns service and image backend health.
///
/// Does not take the generation lock, so it answers while a batch runs.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateway_healthy = match state.synthesizer.health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(backend = state.synthesizer.name(), error = %e, "Gateway health check failed");
            false
        }
    };

    let status = if gateway_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        gateway_healthy,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
