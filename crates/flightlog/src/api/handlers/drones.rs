//! Drone endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{deleted, found, AppState};
use crate::api::error::ApiResult;
use crate::model::{Drone, NewDrone};

/// `GET /api/drones`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Drone>>> {
    Ok(Json(state.storage.lock().list_drones()?))
}

/// `POST /api/drones`
pub async fn create(
    State(state): State<AppState>,
    Json(drone): Json<NewDrone>,
) -> ApiResult<(StatusCode, Json<Drone>)> {
    let drone = state.storage.lock().insert_drone(&drone)?;
    Ok((StatusCode::CREATED, Json(drone)))
}

/// `GET /api/drones/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Drone>> {
    let drone = state.storage.lock().get_drone(id)?;
    found(drone, "drone", id).map(Json)
}

/// `PUT /api/drones/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(drone): Json<NewDrone>,
) -> ApiResult<Json<Drone>> {
    Ok(Json(state.storage.lock().update_drone(id, &drone)?))
}

/// `DELETE /api/drones/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let removed = state.storage.lock().delete_drone(id)?;
    deleted(removed, "drone", id)
}
