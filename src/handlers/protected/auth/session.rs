// handlers/protected/auth/session.rs - GET /api/auth handler

use axum::{extract::State, Extension};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::UserView;
use crate::state::AppState;

/// GET /api/auth - the authenticated user, without the password hash
pub async fn whoami(State(state): State<AppState>, Extension(identity): AuthUser) -> ApiResult<UserView> {
    Ok(ApiResponse::success(state.accounts.whoami(&identity).await?))
}
