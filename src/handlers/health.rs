use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::time::Instant;

use crate::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

/// Liveness check
async fn liveness_check() -> &'static str {
    "OK"
}

/// Readiness check; pings the database when one is attached
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let Some(db) = state.db.as_ref() else {
        return (StatusCode::OK, Json(json!({ "status": "ready" })));
    };

    match crate::db::check_connection(db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "database": { "status": "up" } },
                "response_time_ms": start.elapsed().as_millis()
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "database": { "status": "down", "error": e.to_string() } },
                "response_time_ms": start.elapsed().as_millis()
            })),
        ),
    }
}
