// Public routes (browser-facing)
use crate::app::AppState;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::api_docs;
use crate::handlers::{start, status};

/// Create public routes router
pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route(
            "/start",
            get(start::start_instance).post(start::start_instance),
        )
}

/// Status routes carry their own CORS headers.
pub fn create_status_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/status",
        get(status::get_status).options(status::status_preflight),
    )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api_docs::ApiDoc::openapi())
}

async fn root() -> &'static str {
    "On-demand Instance Control API"
}
