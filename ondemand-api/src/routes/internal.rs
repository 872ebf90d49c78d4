// Internal routes (event bus, scheduler, deployment tooling)
use crate::app::AppState;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

use crate::handlers::{events, urls};

pub fn create_internal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/lifecycle", post(events::lifecycle_event))
        .route("/events/scheduled", post(events::scheduled_event))
        .route("/urls", post(urls::update_urls))
}
