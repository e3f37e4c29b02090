use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use minstrel_core::ServiceError;

use crate::api::{require_auth, AppState};
use crate::model::Viewer;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/me/photo", post(upload_photo))
}

/// GET /blog/me — current user profile.
async fn me(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let user = svc.get_user(&claims.sub).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

/// PATCH /blog/me — merge-patch the current user's profile.
async fn update_me(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let user = svc
        .update_profile(&claims.sub, patch)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}

/// POST /blog/me/photo — upload a profile photo (raw body, typed by the
/// Content-Type header).
async fn upload_photo(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let user = svc
        .upload_photo(&claims.sub, content_type, &body)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(user).unwrap()))
}
