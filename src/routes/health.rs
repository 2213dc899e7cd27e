use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.menu.snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "snapshot": snapshot.is_some() })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "storage": e.to_string() })),
        ),
    }
}
