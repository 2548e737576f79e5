//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health: the process is up and serving requests.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
