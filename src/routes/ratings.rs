use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::visitor::{visitor_cookie, VisitorId},
    models::rating::RateRequest,
    services::ratings::{RatingsService, REFERENCE_TZ},
    AppState,
};

/// POST /api/ratings — submit or replace the caller's rating for a hall.
/// Mints the visitor cookie on first contact, rejected submissions
/// included, so the caller's identity is stable from the first request.
pub async fn submit_rating(
    State(state): State<AppState>,
    VisitorId(visitor): VisitorId,
    Json(body): Json<RateRequest>,
) -> Response {
    rated_response(&state.ratings, visitor, body).await
}

async fn rated_response(
    ratings: &RatingsService,
    visitor: Option<String>,
    body: RateRequest,
) -> Response {
    let (visitor_id, minted) = match visitor {
        Some(v) => (v, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let date_key = RatingsService::today_key();
    let mut response = match ratings
        .add_rating(&date_key, &body.hall_name, body.rating, Some(&visitor_id))
        .await
    {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => e.into_response(),
    };

    if minted {
        if let Ok(cookie) = HeaderValue::from_str(&visitor_cookie(&visitor_id)) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

/// GET /api/ratings/today — per-hall aggregates for today.
pub async fn today_ratings(
    State(state): State<AppState>,
    VisitorId(visitor): VisitorId,
) -> Result<Response, AppError> {
    let byhall = state.ratings.today_averages(visitor.as_deref()).await?;
    let mut response = Json(byhall).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    Ok(response)
}

/// GET /api/ratings/debug — where "today" currently is.
pub async fn debug_info() -> Json<Value> {
    Json(json!({
        "dateKey": RatingsService::today_key(),
        "timezone": REFERENCE_TZ.name(),
        "serverTime": Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::store::memory::MemoryStore;

    fn service() -> RatingsService {
        RatingsService::new(Arc::new(MemoryStore::new()))
    }

    fn request(rating: i64) -> RateRequest {
        RateRequest {
            hall_name: "Hewitt".into(),
            rating,
        }
    }

    #[tokio::test]
    async fn first_contact_is_minted_a_cookie_even_on_rejection() {
        let svc = service();
        let response = rated_response(&svc, None, request(9)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("visitor_id="));
    }

    #[tokio::test]
    async fn returning_visitor_is_not_re_minted() {
        let svc = service();
        let response = rated_response(&svc, Some("v1".into()), request(4)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
