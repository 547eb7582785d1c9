//! Flight endpoints, including property values submitted as JSON or as an
//! HTML form.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{deleted, found, AppState};
use crate::api::error::ApiResult;
use crate::error::Error;
use crate::model::{Flight, FlightFilter, NewFlight};
use crate::properties::{
    extract_property_fields, field_name, PropertyCodec, PropertyData, PropertyDataType,
    PropertyValue,
};

/// Body of `POST /api/flights`.
#[derive(Debug, Deserialize)]
pub struct CreateFlight {
    /// The drone flown.
    pub drone_id: i64,
    /// The operator flying it.
    pub operator_id: i64,
    /// Where the flight took place.
    pub location: String,
    /// Take-off time.
    pub start: NaiveDateTime,
    /// Landing time.
    pub end: NaiveDateTime,
    /// Raw property values keyed by property id.
    #[serde(default)]
    pub properties: HashMap<i64, String>,
}

/// A stored value with its display text.
#[derive(Debug, Serialize)]
pub struct DisplayedValue {
    /// Property id.
    pub property_id: i64,
    /// Property name.
    pub name: String,
    /// Property data type.
    pub data_type: PropertyDataType,
    /// The typed value.
    pub value: PropertyData,
    /// The value rendered back to text.
    pub display: String,
}

impl DisplayedValue {
    fn new(value: &PropertyValue, codec: &PropertyCodec) -> Self {
        Self {
            property_id: value.property_id,
            name: value.definition.name.clone(),
            data_type: value.definition.data_type,
            value: value.value.clone(),
            display: codec.decode(value),
        }
    }
}

/// A submitted field that was not saved.
#[derive(Debug, Serialize)]
pub struct RejectedField {
    /// The form field name, e.g. `FPV_3`.
    pub field: String,
    /// The property id the field refers to, when it could be read.
    pub property_id: Option<i64>,
    /// Stable error code.
    pub code: &'static str,
    /// Description of the problem.
    pub message: String,
}

/// Result of saving a batch of submitted property values.
#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    /// The flight the values belong to.
    pub flight_id: i64,
    /// Values that were saved.
    pub saved: Vec<DisplayedValue>,
    /// Fields that were rejected.
    pub errors: Vec<RejectedField>,
}

/// `GET /api/flights`
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<FlightFilter>,
) -> ApiResult<Json<Vec<Flight>>> {
    Ok(Json(state.storage.lock().list_flights(&filter)?))
}

/// `POST /api/flights`
///
/// The flight is only created if every property value encodes.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateFlight>,
) -> ApiResult<(StatusCode, Json<Flight>)> {
    let flight = NewFlight {
        drone_id: request.drone_id,
        operator_id: request.operator_id,
        location: request.location,
        start: request.start,
        end: request.end,
    };

    let storage = state.storage.lock();
    let catalog = storage.load_catalog()?;
    let encoded = state.codec.encode_submission(&catalog, &request.properties);
    if let Some(rejected) = encoded.rejected.into_iter().next() {
        return Err(rejected.error.into());
    }

    let flight = storage.insert_flight(&flight, &encoded.values)?;
    Ok((StatusCode::CREATED, Json(flight)))
}

/// `GET /api/flights/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Flight>> {
    let flight = state.storage.lock().get_flight(id)?;
    found(flight, "flight", id).map(Json)
}

/// `PUT /api/flights/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(flight): Json<NewFlight>,
) -> ApiResult<Json<Flight>> {
    Ok(Json(state.storage.lock().update_flight(id, &flight)?))
}

/// `DELETE /api/flights/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let removed = state.storage.lock().delete_flight(id)?;
    deleted(removed, "flight", id)
}

/// `GET /api/flights/{id}/properties`
pub async fn list_values(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<DisplayedValue>>> {
    let storage = state.storage.lock();
    found(storage.get_flight(id)?, "flight", id)?;
    let values = storage.property_values(id)?;
    Ok(Json(
        values
            .iter()
            .map(|v| DisplayedValue::new(v, &state.codec))
            .collect(),
    ))
}

/// `PUT /api/flights/{id}/properties`
///
/// Body is a JSON object mapping property ids to raw text.
pub async fn put_values(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(raw): Json<HashMap<i64, String>>,
) -> ApiResult<(StatusCode, Json<SubmissionOutcome>)> {
    save_submission(&state, id, &raw, Vec::new())
}

/// `POST /api/flights/{id}/properties/form`
///
/// Accepts an urlencoded form whose property fields are named with
/// [`field_name`]. Other fields are ignored. Valid values are saved even
/// when some fields are rejected, including fields whose id overflows; the
/// response is `422` in that case.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> ApiResult<(StatusCode, Json<SubmissionOutcome>)> {
    let extracted = extract_property_fields(
        fields
            .iter()
            .map(|(name, value)| (name.as_str(), Some(value.as_str()))),
    )?;
    debug!(
        "Form for flight {} carried {} property fields, {} unreadable",
        id,
        extracted.values.len(),
        extracted.rejected.len()
    );
    save_submission(&state, id, &extracted.values, extracted.rejected)
}

/// Encode raw values, store the good ones and report the rest.
///
/// `unreadable` holds fields already rejected by name; they are reported
/// ahead of the encoding errors.
fn save_submission(
    state: &AppState,
    flight_id: i64,
    raw: &HashMap<i64, String>,
    unreadable: Vec<(String, Error)>,
) -> ApiResult<(StatusCode, Json<SubmissionOutcome>)> {
    let storage = state.storage.lock();
    if storage.get_flight(flight_id)?.is_none() {
        return Err(Error::not_found("flight", flight_id).into());
    }

    let catalog = storage.load_catalog()?;
    let encoded = state.codec.encode_submission(&catalog, raw);
    storage.set_property_values(flight_id, &encoded.values)?;

    let status = if encoded.is_clean() && unreadable.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let outcome = SubmissionOutcome {
        flight_id,
        saved: encoded
            .values
            .iter()
            .map(|v| DisplayedValue::new(v, &state.codec))
            .collect(),
        errors: unreadable
            .into_iter()
            .map(|(field, error)| RejectedField {
                field,
                property_id: None,
                code: error.code(),
                message: error.to_string(),
            })
            .chain(encoded.rejected.into_iter().map(|rejected| RejectedField {
                field: field_name(rejected.property_id),
                property_id: Some(rejected.property_id),
                code: rejected.error.code(),
                message: rejected.error.to_string(),
            }))
            .collect(),
    };
    Ok((status, Json(outcome)))
}
