// handlers/public/profile.rs - anonymous profile reads

use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::ProfileView;
use crate::state::AppState;

/// GET /api/profile - every profile with its owner's name and avatar
pub async fn profile_list(State(state): State<AppState>) -> ApiResult<Vec<ProfileView>> {
    Ok(ApiResponse::success(state.profiles.list().await?))
}

/// GET /api/profile/user/:user_id
pub async fn profile_by_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<ProfileView> {
    let user_id = parse_id(&user_id, "Profile not found")?;
    Ok(ApiResponse::success(state.profiles.by_user(user_id).await?))
}

/// GET /api/profile/github/:username - up to five repositories, straight from GitHub
pub async fn github_repos(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.github.repos(&username).await?))
}
