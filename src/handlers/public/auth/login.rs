// handlers/public/auth/login.rs - POST /api/auth handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::{requests::LoginRequest, ValidatedJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth - exchange email and password for a token
///
/// Unknown email and wrong password both answer
/// `400 { "errors": [{ "msg": "Invalid Credentials" }] }`.
pub async fn login_post(State(state): State<AppState>, ValidatedJson(body): ValidatedJson<LoginRequest>) -> ApiResult<Value> {
    let password = body.password.unwrap_or_default();
    let token = state.accounts.login(&body.email, &password).await?;
    Ok(ApiResponse::success(json!({ "token": token })))
}
