use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One stored crowd rating. For a non-null visitor there is at most one
/// entry per hall across all date keys; a re-submit replaces the old one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RatingEntry {
    pub id: Uuid,
    pub date_key: String,
    pub hall_name: String,
    pub rating: i32,
    pub visitor_id: Option<String>,
    pub at: DateTime<Utc>,
}

/// A rating as handed to the store for insertion.
#[derive(Debug, Clone)]
pub struct NewRating {
    pub date_key: String,
    pub hall_name: String,
    pub rating: i32,
    pub visitor_id: Option<String>,
    pub at: DateTime<Utc>,
}

/// Body for POST /api/ratings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub hall_name: String,
    pub rating: i64,
}

/// Per-hall aggregate returned to clients. `userRating` is present only
/// when the caller's visitor token matches a stored entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
}
