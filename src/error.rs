// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::services::ServiceError;

/// One failed input rule, reported as `{ "msg": ..., "param": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            param: Some(param.into()),
        }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self { msg: msg.into(), param: None }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    Validation(Vec<FieldError>),
    InvalidJson(String),
    DuplicateAccount,
    InvalidCredentials,
    AlreadyLiked,
    NotLiked,
    UpstreamFailure(String),

    // 401 Unauthorized
    NoToken,
    InvalidToken,
    NotAuthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error (detail is logged, never sent)
    ServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidJson(_)
            | ApiError::DuplicateAccount
            | ApiError::InvalidCredentials
            | ApiError::AlreadyLiked
            | ApiError::NotLiked
            | ApiError::UpstreamFailure(_) => StatusCode::BAD_REQUEST,
            ApiError::NoToken | ApiError::InvalidToken | ApiError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(_) => "Invalid request",
            ApiError::InvalidJson(msg) => msg,
            ApiError::DuplicateAccount => "User already exists",
            ApiError::InvalidCredentials => "Invalid Credentials",
            ApiError::AlreadyLiked => "Post already liked",
            ApiError::NotLiked => "Post has not yet been liked",
            ApiError::UpstreamFailure(_) => "No Github profile found",
            ApiError::NoToken => "No token, authorization denied",
            ApiError::InvalidToken => "Token is not valid",
            ApiError::NotAuthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::ServerError(_) => "Server Error",
        }
    }

    /// Convert to JSON response body
    ///
    /// Input problems use the `errors` list shape; everything else is `{ msg }`.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            ApiError::InvalidJson(_) | ApiError::DuplicateAccount | ApiError::InvalidCredentials => {
                json!({ "errors": [FieldError::message(self.message())] })
            }
            _ => json!({ "msg": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        ApiError::NotAuthorized(message.into())
    }

    pub fn server_error(detail: impl Into<String>) -> Self {
        ApiError::ServerError(detail.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Conflict(msg) => {
                tracing::warn!("Write conflict not resolved by retries: {}", msg);
                ApiError::Conflict("The resource was modified concurrently, please retry".to_string())
            }
            other => {
                // Don't expose storage errors to clients
                tracing::error!("Document store error: {}", other);
                ApiError::server_error(other.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::DuplicateAccount => ApiError::DuplicateAccount,
            ServiceError::InvalidCredentials => ApiError::InvalidCredentials,
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::MissingField(field) => {
                let mut label = field.to_string();
                if let Some(first) = label.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                ApiError::validation(vec![FieldError::new(field, format!("{} is required", label))])
            }
            ServiceError::NotAuthorized => ApiError::not_authorized("User not authorized"),
            ServiceError::AlreadyLiked => ApiError::AlreadyLiked,
            ServiceError::NotLiked => ApiError::NotLiked,
            ServiceError::Upstream(detail) => {
                tracing::warn!("GitHub lookup failed: {}", detail);
                ApiError::UpstreamFailure(detail)
            }
            ServiceError::Store(e) => e.into(),
            ServiceError::Token(e) => {
                tracing::error!("Token error: {}", e);
                ApiError::server_error(e.to_string())
            }
            ServiceError::Password(e) => {
                tracing::error!("Password error: {}", e);
                ApiError::server_error(e.to_string())
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::ServerError(detail) => write!(f, "Server Error: {}", detail),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
