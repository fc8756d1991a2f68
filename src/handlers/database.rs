use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::api::ValidJson;
use crate::database::models::TodoRow;
use crate::database::TodoRepository;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::todo::validate::validate_candidate;
use crate::todo::TodoCreate;

/// POST /setup_database - Drop and recreate every table.
///
/// Only the relational copy is reset; the in-memory store is untouched.
pub async fn setup(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.database()?.reset().await?;
    info!("Database reset via API");
    Ok(Json(json!({ "ok": true })))
}

/// POST /todo_db - Insert a row directly, bypassing the in-memory store.
///
/// The id is taken from the store's sequence so it can never collide with a
/// todo the store creates later.
pub async fn insert(
    State(state): State<AppState>,
    ValidJson(candidate): ValidJson<TodoCreate>,
) -> ApiResult<Json<Value>> {
    let db = state.database()?;
    validate_candidate(&candidate)?;

    let id = state.store.reserve_id().await;
    TodoRepository::new(db.pool().clone())
        .insert(&candidate.into_todo(id))
        .await?;
    info!(todo_id = id, "inserted todo row directly");
    Ok(Json(json!({ "ok": true, "id": id })))
}

/// GET /todo_db - All rows of the todos table
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<TodoRow>>> {
    let db = state.database()?;
    let rows = TodoRepository::new(db.pool().clone()).select_all().await?;
    Ok(Json(rows))
}
