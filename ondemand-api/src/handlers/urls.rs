use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ondemand_orchestrator::logger;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn, Instrument};
use utoipa::ToSchema;

use crate::app::AppState;

pub const URLS_UPDATED_MESSAGE: &str = "URLs updated successfully";
pub const URLS_ERROR_MESSAGE: &str = "Error updating URLs";

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUrlsRequest {
    /// Overrides the configured default url.
    pub api_gateway_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUrlsResponse {
    pub message: String,
    pub api_gateway_url: String,
    pub start_url: String,
    pub status_url: String,
}

#[utoipa::path(
    post,
    path = "/urls",
    request_body = UpdateUrlsRequest,
    responses(
        (status = 200, description = "URLs published", body = UpdateUrlsResponse),
        (status = 500, description = "Publishing failed", body = serde_json::Value)
    )
)]
pub async fn update_urls(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // Body is optional; an unreadable one is treated like an empty one.
    let request: UpdateUrlsRequest = if body.is_empty() {
        UpdateUrlsRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!("[API] Ignoring unreadable /urls body: {}", e);
            UpdateUrlsRequest::default()
        })
    };

    let result = state
        .services
        .publish_url(request.api_gateway_url.as_deref())
        .instrument(logger::invocation_span("urls"))
        .await;

    match result {
        Ok(urls) => Json(UpdateUrlsResponse {
            message: URLS_UPDATED_MESSAGE.to_string(),
            api_gateway_url: urls.api_url,
            start_url: urls.start_url,
            status_url: urls.status_url,
        })
        .into_response(),
        Err(e) => {
            error!(kind = e.kind(), "[API] Error updating URLs: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": URLS_ERROR_MESSAGE })),
            )
                .into_response()
        }
    }
}
