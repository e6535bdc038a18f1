// handlers/protected/posts.rs - posts, likes and comments

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::api::requests::TextRequest;
use crate::api::{parse_id, ValidatedJson};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Comment, EmbeddedList, Like, Post};
use crate::state::AppState;

const POST_NOT_FOUND: &str = "Post not found";

/// POST /api/posts
pub async fn post_create(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    ValidatedJson(body): ValidatedJson<TextRequest>,
) -> ApiResult<Post> {
    Ok(ApiResponse::created(state.posts.create(&identity, body.text).await?))
}

/// GET /api/posts - newest first
pub async fn post_list(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    Ok(ApiResponse::success(state.posts.list().await?))
}

/// GET /api/posts/:id
pub async fn post_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(ApiResponse::success(state.posts.get(id).await?))
}

/// DELETE /api/posts/:id - author only
pub async fn post_delete(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    state.posts.delete(&identity, id).await?;
    Ok(ApiResponse::message("Post removed"))
}

/// PUT /api/posts/like/:id
pub async fn post_like(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<EmbeddedList<Like>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(ApiResponse::success(state.posts.like(&identity, id).await?))
}

/// PUT /api/posts/unlike/:id
pub async fn post_unlike(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<EmbeddedList<Like>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(ApiResponse::success(state.posts.unlike(&identity, id).await?))
}

/// POST /api/posts/comment/:id
pub async fn comment_add(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<TextRequest>,
) -> ApiResult<EmbeddedList<Comment>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    Ok(ApiResponse::success(state.posts.add_comment(&identity, id, body.text).await?))
}

/// DELETE /api/posts/comment/:id/:comment_id - comment author only
pub async fn comment_remove(
    State(state): State<AppState>,
    Extension(identity): AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<EmbeddedList<Comment>> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, "Comment does not exist")?;
    Ok(ApiResponse::success(state.posts.remove_comment(&identity, id, comment_id).await?))
}
