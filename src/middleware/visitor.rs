use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

pub const VISITOR_COOKIE: &str = "visitor_id";

/// 30 days, like the original cookie the frontend already carries.
const COOKIE_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// The caller's opaque visitor token, when the cookie is present.
/// Carries no personal data; minted server-side on first rating submit.
pub struct VisitorId(pub Option<String>);

impl<S> FromRequestParts<S> for VisitorId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let id = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(find_visitor_cookie);
        Ok(VisitorId(id))
    }
}

fn find_visitor_cookie(raw: &str) -> Option<String> {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == VISITOR_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Set-Cookie value for a freshly minted visitor token.
pub fn visitor_cookie(id: &str) -> String {
    format!("{VISITOR_COOKIE}={id}; HttpOnly; Max-Age={COOKIE_MAX_AGE_SECS}; SameSite=Lax; Path=/")
}
