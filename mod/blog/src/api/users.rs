use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use minstrel_core::{ListParams, ServiceError};

use crate::api::{require_auth, AppState};
use crate::model::{RegisterRequest, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users).post(register))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/posts", get(user_posts))
        .route("/users/{id}/following", get(following))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/stats", get(stats))
        .route("/users/{id}/follow", post(toggle_follow))
}

/// POST /blog/users — register a new account.
async fn register(
    State(svc): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ServiceError> {
    let user = svc.register(input).map_err(ServiceError::from)?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(serde_json::to_value(user).unwrap()),
    ))
}

/// GET /blog/users?q= — search users by handle.
async fn search_users(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let result = svc.search_users(&params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let user = svc.get_user(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

async fn user_posts(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let posts = svc
        .user_posts(&viewer, &id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": posts})))
}

async fn following(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let users = svc.list_following(&id, &params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": users})))
}

async fn followers(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let users = svc.list_followers(&id, &params).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({"items": users})))
}

async fn stats(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let stats = svc.follow_stats(&id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(stats).unwrap()))
}

/// POST /blog/users/{id}/follow — toggle following the given user.
async fn toggle_follow(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let state = svc
        .toggle_follow(&claims.sub, &id)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(state).unwrap()))
}
