//! Bearer-token authentication for `/api` routes.
//!
//! Callers present the static token configured as `API_TOKEN`:
//!
//! ```text
//! Authorization: Bearer <API_TOKEN>
//! ```
//!
//! Anything else is answered with 401 before the handler runs, so neither
//! the rule store nor the resolver is reached.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Middleware rejecting requests without the configured bearer token.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(token) = header.and_then(extract_bearer_token) else {
        warn!(path = %request.uri().path(), "Request without bearer token");
        return Err(ApiError::unauthorized("Missing bearer token"));
    };

    if !tokens_match(token, &state.config.api_token) {
        warn!(path = %request.uri().path(), "Request with invalid bearer token");
        return Err(ApiError::unauthorized("Invalid bearer token"));
    }

    Ok(next.run(request).await)
}
