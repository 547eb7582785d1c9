//! User endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{deleted, found, AppState};
use crate::api::error::ApiResult;
use crate::model::{NewUser, User};

/// `GET /api/users`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.storage.lock().list_users()?))
}

/// `POST /api/users`
pub async fn create(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.storage.lock().insert_user(&user)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<User>> {
    let user = state.storage.lock().get_user(id)?;
    found(user, "user", id).map(Json)
}

/// `DELETE /api/users/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let removed = state.storage.lock().delete_user(id)?;
    deleted(removed, "user", id)
}
