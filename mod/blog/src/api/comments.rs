use axum::extract::{Extension, Path, State};
use axum::routing::delete;
use axum::Router;

use minstrel_core::ServiceError;

use crate::api::{require_auth, AppState};
use crate::model::Viewer;

pub fn routes() -> Router<AppState> {
    Router::new().route("/comments/{id}", delete(delete_comment))
}

/// DELETE /blog/comments/{id} — by the comment author or the post author.
async fn delete_comment(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServiceError> {
    let claims = require_auth(&viewer)?;
    svc.delete_comment(&id, &claims.sub)
        .map_err(ServiceError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
