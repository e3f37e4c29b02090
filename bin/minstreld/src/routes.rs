//! Route registration — module routes plus system endpoints.

use axum::routing::get;
use axum::{Json, Router};

/// Build the complete router with all routes.
pub fn build_router(module_routes: Vec<(String, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    // Mount each module's routes under /{module_name}.
    // Module routers are already Router<()> (they called .with_state()
    // internally).
    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
