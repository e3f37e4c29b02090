mod users;
mod session;
mod me;
mod posts;
mod comments;
mod news;
mod music;
mod middleware;

use std::sync::Arc;

use axum::Router;

use minstrel_core::ServiceError;

use crate::model::{Claims, Viewer};
use crate::service::BlogService;

/// Shared application state.
pub type AppState = Arc<BlogService>;

/// Claims of the authenticated viewer, or `Unauthorized`.
pub(crate) fn require_auth(viewer: &Viewer) -> Result<&Claims, ServiceError> {
    viewer
        .claims()
        .ok_or_else(|| ServiceError::Unauthorized("login required".into()))
}

/// Build the complete blog API router.
///
/// All routes are relative; the caller nests them under `/blog`.
pub fn build_router(svc: Arc<BlogService>) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(session::routes())
        .merge(me::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(news::routes())
        .merge(music::routes())
        .layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::viewer_middleware,
        ))
        .with_state(svc)
}
