//! Property definition endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{deleted, found, AppState};
use crate::api::error::ApiResult;
use crate::properties::{NewPropertyDefinition, PropertyDefinition};

/// `GET /api/properties`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PropertyDefinition>>> {
    Ok(Json(state.storage.lock().list_properties()?))
}

/// `POST /api/properties`
pub async fn create(
    State(state): State<AppState>,
    Json(property): Json<NewPropertyDefinition>,
) -> ApiResult<(StatusCode, Json<PropertyDefinition>)> {
    let property = state.storage.lock().insert_property(&property)?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// `GET /api/properties/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PropertyDefinition>> {
    let property = state.storage.lock().get_property(id)?;
    found(property, "property", id).map(Json)
}

/// `PUT /api/properties/{id}`
///
/// The data type can only change while no flight has a value for the
/// property.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(property): Json<NewPropertyDefinition>,
) -> ApiResult<Json<PropertyDefinition>> {
    Ok(Json(state.storage.lock().update_property(id, &property)?))
}

/// `DELETE /api/properties/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let removed = state.storage.lock().delete_property(id)?;
    deleted(removed, "property", id)
}
