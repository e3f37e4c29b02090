use axum::extract::{Extension, Path, State};
use axum::routing::get;
use axum::{Json, Router};

use minstrel_core::ServiceError;

use crate::api::{require_auth, AppState};
use crate::model::{NewsCategory, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(counts))
        .route("/news/{category}", get(open_category))
}

/// GET /blog/news — unread counts per category.
async fn counts(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let counts = svc.news_counts(&claims.sub).map_err(ServiceError::from)?;
    Ok(Json(serde_json::to_value(counts).unwrap()))
}

/// GET /blog/news/{category} — open a category: returns the unread items
/// and acknowledges them. The items are marked read once returned.
async fn open_category(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(category): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = require_auth(&viewer)?;
    let category = NewsCategory::from_slug(&category).ok_or_else(|| {
        ServiceError::NotFound(format!("unknown news category '{}'", category))
    })?;

    let items = match category {
        NewsCategory::Likes => serde_json::to_value(
            svc.open_likes(&claims.sub).map_err(ServiceError::from)?,
        ),
        NewsCategory::Comments => serde_json::to_value(
            svc.open_comments(&claims.sub).map_err(ServiceError::from)?,
        ),
        NewsCategory::Forwards => serde_json::to_value(
            svc.open_forwards(&claims.sub).map_err(ServiceError::from)?,
        ),
        NewsCategory::Follows => serde_json::to_value(
            svc.open_follows(&claims.sub).map_err(ServiceError::from)?,
        ),
    }
    .map_err(|e| ServiceError::Internal(e.to_string()))?;

    Ok(Json(serde_json::json!({"items": items})))
}
