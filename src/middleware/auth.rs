use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// Token gate for protected routes.
///
/// Reads the configured token header, verifies it and stores the caller's
/// [`Identity`] in the request extensions for handlers to extract.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config.security.token_header)?;

    let identity = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::InvalidToken
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Raw token from the header; missing, empty and non-UTF-8 values all count as no token.
fn extract_token<'a>(headers: &'a HeaderMap, header: &str) -> Result<&'a str, ApiError> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::NoToken)
}

/// The identity placed by [`require_auth`]; only valid behind that layer.
pub type AuthUser = axum::Extension<Identity>;
