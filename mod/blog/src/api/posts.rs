use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use minstrel_core::{ListParams, ServiceError};

use crate::api::{require_auth, AppState};
use crate::model::{CreateComment, CreatePost, ForwardRequest, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(home_feed).post(publish))
        .route("/posts/top", get(top_posts))
        .route("/posts/search", get(search_posts))
        .route("/posts/{id}", get(get_post).delete(delete_post))
        .route("/posts/{id}/like", post(toggle_like))
        .route("/posts/{id}/forward", post(forward))
        .route("/posts/{id}/comments", get(list_comments).post(add_comment))
}

/// GET /blog/posts — the viewer's home feed (followed accounts).
async fn home_feed(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let posts = svc.home_feed(&viewer, &params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": posts})))
}

/// POST /blog/posts — publish a new post.
async fn publish(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(input): Json<CreatePost>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let claims = require_auth(&viewer)?;
    let post = svc.publish(&claims.sub, input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(post).unwrap()),
    ))
}

#[derive(Deserialize)]
struct TopParams {
    #[serde(default = "default_top_limit")]
    limit: usize,
}

fn default_top_limit() -> usize {
    5
}

/// GET /blog/posts/top — most popular public posts.
async fn top_posts(
    State(svc): State<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let posts = svc.top_posts(params.limit).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": posts})))
}

/// GET /blog/posts/search?q= — public posts by title substring.
async fn search_posts(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let posts = svc.search_posts(&params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": posts})))
}

/// GET /blog/posts/{id} — detail view. Every read counts a view, and the
/// returned view count includes it.
async fn get_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let detail = svc.view_post(&viewer, &id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(detail).unwrap()))
}

async fn delete_post(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    let claims = require_auth(&viewer)?;
    svc.delete_post(&id, &claims.sub).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /blog/posts/{id}/like — toggle the viewer's like.
async fn toggle_like(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let state = svc.toggle_like(&id, &claims.sub).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(state).unwrap()))
}

/// POST /blog/posts/{id}/forward — forward with commentary.
async fn forward(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(input): Json<ForwardRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let claims = require_auth(&viewer)?;
    let post = svc
        .forward(&id, &claims.sub, input)
        .map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(post).unwrap()),
    ))
}

async fn list_comments(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let comments = svc.list_comments(&id, &params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": comments})))
}

async fn add_comment(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Json(input): Json<CreateComment>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let claims = require_auth(&viewer)?;
    let comment = svc
        .add_comment(&id, &claims.sub, &input.content)
        .map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(comment).unwrap()),
    ))
}
