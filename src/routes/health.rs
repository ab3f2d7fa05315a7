//! Health check endpoint for process supervisors and load balancers.

use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[tracing::instrument(name = "health.check")]
pub async fn health() -> impl IntoResponse {
    let body = HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(body))
}
