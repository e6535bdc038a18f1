// handlers/public/auth/register.rs - POST /api/users handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::{requests::RegisterRequest, ValidatedJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/users - create an account and sign it in
pub async fn register_post(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> ApiResult<Value> {
    let token = state.accounts.register(body).await?;
    Ok(ApiResponse::success(json!({ "token": token })))
}
