use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// GET / - Liveness greeting
pub async fn hello() -> Json<&'static str> {
    Json("Hello")
}

/// GET /health - Store size and database connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let todos = state.store.len().await;

    let Some(db) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "disabled", "todos": todos })),
        );
    };

    match db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok", "todos": todos })),
        ),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unavailable", "todos": todos })),
            )
        }
    }
}
