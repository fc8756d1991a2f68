use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::{ValidJson, ValidPath, ValidQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::todo::{Todo, TodoCreate, TodoPatch};
use crate::types::TodoId;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Return only the first n todos
    pub first_n: Option<i64>,
}

/// GET /todos - List todos in insertion order
pub async fn list(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListQuery>,
) -> ApiResult<Json<Vec<Todo>>> {
    let limit = match query.first_n {
        None => None,
        Some(n) if n < 0 => return Err(ApiError::invalid_field("first_n", "must be zero or greater")),
        Some(0) if state.config.todos.legacy_zero_first_n => None,
        Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
    };

    Ok(Json(state.store.list(limit).await))
}

/// GET /todos/:id - Get a single todo
pub async fn get(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<TodoId>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.store.get(id).await?))
}

/// POST /todos - Create a todo; the id is assigned by the store.
///
/// The store queues every committed mutation for the database mirror.
pub async fn create(
    State(state): State<AppState>,
    ValidJson(candidate): ValidJson<TodoCreate>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.store.create(candidate).await?))
}

/// PUT /todos/:id - Partially update a todo
pub async fn update(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<TodoId>,
    ValidJson(patch): ValidJson<TodoPatch>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.store.update(id, patch).await?))
}

/// DELETE /todos/:id - Delete a todo and return it
pub async fn delete(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<TodoId>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.store.delete(id).await?))
}
