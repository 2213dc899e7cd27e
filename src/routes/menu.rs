use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::{
    error::AppError,
    models::menu::{CanonicalSnapshot, MealSlot},
    AppState,
};

/// GET /api/menu — every meal slot with its ordered hall list.
pub async fn get_menu(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let snapshot = state.menu.snapshot().await?;
    Ok(Json(menu_payload(snapshot)))
}

/// GET /api/menu/{meal} — one meal slot; unknown names are 404.
pub async fn get_meal(
    State(state): State<AppState>,
    Path(meal): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Meal '{meal}' not found") })),
        )
            .into_response()
    };

    let Some(slot) = MealSlot::parse(&meal) else {
        return Ok(not_found());
    };
    let Some(snapshot) = state.menu.snapshot().await? else {
        return Ok(not_found());
    };
    let halls = snapshot.by_meal.get(&slot).cloned().unwrap_or_default();
    Ok(Json(json!({ "meal": slot.as_str(), "halls": halls })).into_response())
}

fn menu_payload(snapshot: Option<CanonicalSnapshot>) -> Value {
    let Some(snapshot) = snapshot else {
        return json!({});
    };
    let mut payload = Map::new();
    for (slot, halls) in &snapshot.by_meal {
        payload.insert(
            slot.as_str().to_string(),
            json!({ "meal": slot.as_str(), "halls": halls }),
        );
    }
    payload.insert("updatedAt".into(), json!(snapshot.updated_at));
    Value::Object(payload)
}
