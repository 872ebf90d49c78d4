use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ondemand_orchestrator::logger;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, Instrument};

use crate::app::AppState;

pub const ALREADY_RUNNING_MESSAGE: &str = "Instance is already running or starting";
pub const STARTUP_INITIATED_MESSAGE: &str = "Instance startup initiated";
pub const START_ERROR_MESSAGE: &str = "Failed to start instance. Please try again later.";

/// Configured status page, else the `starting.html` page next to this API.
fn redirect_target(status_page_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = status_page_url {
        return url.to_string();
    }
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("https://{}/starting.html", host),
        None => "/starting.html".to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/start",
    responses(
        (status = 302, description = "Redirect to the status page", body = serde_json::Value),
        (status = 500, description = "Start failed", body = serde_json::Value)
    )
)]
pub async fn start_instance(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = state
        .services
        .start()
        .instrument(logger::invocation_span("start"))
        .await;

    match result {
        Ok(outcome) => {
            let message = if outcome.already_running {
                ALREADY_RUNNING_MESSAGE
            } else {
                STARTUP_INITIATED_MESSAGE
            };
            info!("[API] /start: {}", message);
            let location = redirect_target(state.services.config().status_page_url.as_deref(), &headers);
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, location),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                Json(json!({ "message": message })),
            )
                .into_response()
        }
        Err(e) => {
            error!(kind = e.kind(), "[API] Error starting instance: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CACHE_CONTROL, "no-cache")],
                Json(json!({ "error": START_ERROR_MESSAGE })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn redirect_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("abc.execute-api.example"));
        assert_eq!(
            redirect_target(None, &headers),
            "https://abc.execute-api.example/starting.html"
        );
    }

    #[test]
    fn configured_status_page_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("ignored"));
        assert_eq!(
            redirect_target(Some("https://status.example/"), &headers),
            "https://status.example/"
        );
    }

    #[test]
    fn missing_host_falls_back_to_relative_path() {
        assert_eq!(redirect_target(None, &HeaderMap::new()), "/starting.html");
    }
}
