use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use minstrel_core::ServiceError;

use crate::api::{require_auth, AppState};
use crate::model::{UploadMusic, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/music", post(upload))
        .route("/music/{id}", get(fetch))
}

/// POST /blog/music?song_name=&singer= — upload an audio track (raw body,
/// typed by the Content-Type header).
async fn upload(
    State(svc): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(meta): Query<UploadMusic>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    require_auth(&viewer)?;
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let music = svc
        .upload_music(meta.singer.as_deref(), &meta.song_name, content_type, &body)
        .map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(music).unwrap()),
    ))
}

/// GET /blog/music/{id} — stream the stored audio bytes.
async fn fetch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let (music, data) = svc.fetch_music(&id).map_err(ServiceError::from)?;
    Ok((
        [(header::CONTENT_TYPE, music.content_type)],
        data,
    ))
}
