use axum::Json;
use serde_json::{json, Value};

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "LionDine menu API",
        "endpoints": {
            "GET /api/menu": "All meals (breakfast, lunch, dinner, latenight)",
            "GET /api/menu/{meal}": "Single meal (e.g. /api/menu/breakfast)",
            "GET /api/ratings/today": "Today's per-hall crowd ratings",
            "POST /api/ratings": "Submit a rating { hallName, rating }",
        },
    }))
}
