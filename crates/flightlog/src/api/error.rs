//! HTTP rendering of [`Error`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// An [`Error`] returned from a handler.
///
/// Renders as `{"code": "...", "message": "..."}`. Clients match on `code`,
/// which never changes; messages may be reworded.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        status_for(&self.0)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// HTTP status for an error.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Conflict { .. } | Error::AlreadyImported { .. } => StatusCode::CONFLICT,
        Error::Validation { .. }
        | Error::InvalidFormat { .. }
        | Error::MissingField { .. }
        | Error::OutOfRange { .. }
        | Error::UnknownProperty { .. }
        | Error::DuplicateField { .. }
        | Error::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
