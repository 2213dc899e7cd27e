use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{scrape::ScrapeError, store::StoreError};

/// Failure taxonomy surfaced by services.
///
/// `Validation` is user-correctable and maps to 400; everything else is
/// a server-side failure and maps to 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("source fetch failed: {0}")]
    Source(#[from] ScrapeError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Source(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
