use axum::extract::State;
use axum::Json;

use crate::api::{ValidJson, ValidPath};
use crate::database::models::UserAccount;
use crate::error::ApiResult;
use crate::services::UserRegistration;
use crate::state::AppState;

/// POST /users - Register a user account
///
/// Expected Input:
/// ```json
/// { "user_email": "string", "user_password": "string" }
/// ```
/// The password is stored only as an Argon2id hash and never returned.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(registration): ValidJson<UserRegistration>,
) -> ApiResult<Json<UserAccount>> {
    let account = state.users()?.register(registration).await?;
    Ok(Json(account))
}

/// GET /users/:id - Public view of one account
pub async fn get(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<UserAccount>> {
    Ok(Json(state.users()?.get(id).await?))
}
