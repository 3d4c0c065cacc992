use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness probe; does not touch the store.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
