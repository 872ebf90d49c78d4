// Routes module - Centralizes all route definitions
pub mod internal;
pub mod public;

use axum::Router;
use crate::app::{create_cors, AppState};
use std::sync::Arc;

/// Build the main application router.
/// `/status` answers its own CORS preflight with fixed headers, so it sits outside the CORS layer.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(public::create_public_routes())
        .merge(internal::create_internal_routes())
        .layer(create_cors())
        .merge(public::create_status_routes())
}
