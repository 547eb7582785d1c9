//! Operator endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{deleted, found, AppState};
use crate::api::error::ApiResult;
use crate::model::{NewOperator, Operator};

/// `GET /api/operators`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Operator>>> {
    Ok(Json(state.storage.lock().list_operators()?))
}

/// `POST /api/operators`
pub async fn create(
    State(state): State<AppState>,
    Json(operator): Json<NewOperator>,
) -> ApiResult<(StatusCode, Json<Operator>)> {
    let operator = state.storage.lock().insert_operator(&operator)?;
    Ok((StatusCode::CREATED, Json(operator)))
}

/// `GET /api/operators/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Operator>> {
    let operator = state.storage.lock().get_operator(id)?;
    found(operator, "operator", id).map(Json)
}

/// `PUT /api/operators/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(operator): Json<NewOperator>,
) -> ApiResult<Json<Operator>> {
    Ok(Json(state.storage.lock().update_operator(id, &operator)?))
}

/// `DELETE /api/operators/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let removed = state.storage.lock().delete_operator(id)?;
    deleted(removed, "operator", id)
}
