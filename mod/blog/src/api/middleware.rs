use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{middleware::Next, Json};
use serde_json::json;

use crate::api::AppState;
use crate::model::Viewer;

/// Viewer resolution middleware.
///
/// Requests without an Authorization header proceed as Anonymous; most
/// read paths are public. A Bearer token that fails verification is an
/// immediate 401 rather than a silent downgrade to Anonymous. Handlers
/// access the result via `Extension<Viewer>`.
pub async fn viewer_middleware(
    State(svc): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let viewer = match extract_bearer(req.headers()) {
        None => Viewer::Anonymous,
        Some(token) => match svc.verify_token(token) {
            Ok(claims) => Viewer::Authenticated(claims),
            Err(e) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "code": "UNAUTHENTICATED",
                        "message": e.to_string(),
                    })),
                )
                    .into_response();
            }
        },
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
