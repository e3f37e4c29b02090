use axum::extract::{Extension, State};
use axum::routing::post;
use axum::{Json, Router};

use minstrel_core::ServiceError;

use crate::api::{require_auth, AppState};
use crate::model::{LoginRequest, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /blog/login — exchange credentials for a bearer token.
async fn login(
    State(svc): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let tokens = svc
        .login(&input.handle, &input.password)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(tokens).unwrap()))
}

/// POST /blog/logout — revoke the current session.
async fn logout(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<axum::http::StatusCode, ServiceError> {
    let claims = require_auth(&viewer)?;
    svc.revoke_session(&claims.sid).map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
