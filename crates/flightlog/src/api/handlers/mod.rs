//! Request handlers for the logbook API.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports the handler modules used by the router.

pub mod drones;
pub mod flights;
pub mod health;
pub mod operators;
pub mod properties;
pub mod users;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use parking_lot::Mutex;

use super::error::ApiResult;
use crate::error::Error;
use crate::properties::PropertyCodec;
use crate::storage::Storage;

/// Shared application state passed to all handlers via `State` extraction.
///
/// Holds `Arc` references so cloning is cheap. The storage lock is never
/// held across an `.await`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The logbook database.
    pub storage: Arc<Mutex<Storage>>,
    /// Converts submitted text to property values and back.
    pub codec: Arc<PropertyCodec>,
    /// Server start time, used for uptime.
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an open storage.
    #[must_use]
    pub fn new(storage: Storage, codec: PropertyCodec) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            codec: Arc::new(codec),
            start_time: Instant::now(),
        }
    }
}

/// Turn the outcome of a delete into `204 No Content` or `404`.
fn deleted(found: bool, entity: &'static str, id: i64) -> ApiResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(entity, id).into())
    }
}

/// Turn a lookup into the record or `404`.
fn found<T>(record: Option<T>, entity: &'static str, id: i64) -> ApiResult<T> {
    record.ok_or_else(|| Error::not_found(entity, id).into())
}
