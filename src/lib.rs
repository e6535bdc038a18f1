pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub use config::AppConfig;
pub use state::AppState;

/// Full application router with state and global middleware applied.
pub fn app(state: AppState) -> Router {
    let api = public_routes().merge(protected_routes(state.clone()));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(RequestBodyLimitLayer::new(state.config.api.max_request_size_bytes));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/auth", post(public::login_post))
        .route("/users", post(public::register_post))
        .route("/profile", get(public::profile_list))
        .route("/profile/user/:user_id", get(public::profile_by_user))
        .route("/profile/github/:username", get(public::github_repos))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route("/auth", get(protected::session_whoami))
        // Posts
        .route("/posts", get(protected::post_list).post(protected::post_create))
        .route("/posts/:id", get(protected::post_get).delete(protected::post_delete))
        .route("/posts/like/:id", put(protected::post_like))
        .route("/posts/unlike/:id", put(protected::post_unlike))
        .route("/posts/comment/:id", post(protected::comment_add))
        .route("/posts/comment/:id/:comment_id", delete(protected::comment_remove))
        // Own profile
        .route("/profile/me", get(protected::profile_me))
        .route("/profile", post(protected::profile_upsert).delete(protected::profile_delete))
        .route("/profile/experience", put(protected::experience_add))
        .route("/profile/experience/:exp_id", delete(protected::experience_remove))
        .route("/profile/education", put(protected::education_add))
        .route("/profile/education/:edu_id", delete(protected::education_remove))
        .route_layer(axum::middleware::from_fn_with_state(state, middleware::require_auth))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "DevConnect API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth, /api/users",
            "profile": "/api/profile[/me|/user/:user_id|/github/:username|/experience|/education]",
            "posts": "/api/posts[/:id|/like/:id|/unlike/:id|/comment/:id[/:comment_id]]",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}
