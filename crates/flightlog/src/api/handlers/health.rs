//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::api::error::ApiResult;

/// Returns server status and logbook statistics as JSON.
pub async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.storage.lock().stats()?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "stats": stats,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyCodec;
    use crate::storage::Storage;

    #[tokio::test]
    async fn health_handler_reports_stats() {
        let state = AppState::new(Storage::open_in_memory().unwrap(), PropertyCodec::default());

        let Json(body) = health_handler(State(state)).await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["stats"]["flights"], 0);
    }
}
