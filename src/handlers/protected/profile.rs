// handlers/protected/profile.rs - the caller's own profile and its sub-collections

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::api::requests::{EducationRequest, ExperienceRequest, ProfileRequest};
use crate::api::{parse_id, ValidatedJson};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::ProfileView;
use crate::services::profiles::{education_entry, experience_entry};
use crate::state::AppState;

/// GET /api/profile/me
pub async fn profile_me(State(state): State<AppState>, Extension(identity): AuthUser) -> ApiResult<ProfileView> {
    Ok(ApiResponse::success(state.profiles.me(&identity).await?))
}

/// POST /api/profile - create or update the caller's profile
///
/// Only non-empty fields are written. Social links are always replaced by
/// the links in this request, so omitting them clears them.
pub async fn profile_upsert(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    ValidatedJson(body): ValidatedJson<ProfileRequest>,
) -> ApiResult<ProfileView> {
    Ok(ApiResponse::success(state.profiles.upsert(&identity, body.into()).await?))
}

/// DELETE /api/profile - remove the caller's profile and account
pub async fn profile_delete(State(state): State<AppState>, Extension(identity): AuthUser) -> ApiResult<Value> {
    state.accounts.delete_account(&identity).await?;
    Ok(ApiResponse::message("User deleted"))
}

/// PUT /api/profile/experience
pub async fn experience_add(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    ValidatedJson(body): ValidatedJson<ExperienceRequest>,
) -> ApiResult<ProfileView> {
    let dates = body.date_range().map_err(ApiError::validation)?;
    let entry = experience_entry(body, dates);
    Ok(ApiResponse::success(state.profiles.add_experience(&identity, entry).await?))
}

/// DELETE /api/profile/experience/:exp_id
pub async fn experience_remove(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(exp_id): Path<String>,
) -> ApiResult<ProfileView> {
    let exp_id = parse_id(&exp_id, "Experience not found")?;
    Ok(ApiResponse::success(state.profiles.remove_experience(&identity, exp_id).await?))
}

/// PUT /api/profile/education
pub async fn education_add(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    ValidatedJson(body): ValidatedJson<EducationRequest>,
) -> ApiResult<ProfileView> {
    let dates = body.date_range().map_err(ApiError::validation)?;
    let entry = education_entry(body, dates);
    Ok(ApiResponse::success(state.profiles.add_education(&identity, entry).await?))
}

/// DELETE /api/profile/education/:edu_id
pub async fn education_remove(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(edu_id): Path<String>,
) -> ApiResult<ProfileView> {
    let edu_id = parse_id(&edu_id, "Education not found")?;
    Ok(ApiResponse::success(state.profiles.remove_education(&identity, edu_id).await?))
}
