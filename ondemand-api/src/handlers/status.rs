use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use ondemand_common::StatusChecks;
use ondemand_orchestrator::logger;
use ondemand_orchestrator::status_reconciler::{StatusReport, ERROR_MESSAGE};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;

use crate::app::AppState;

const ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key";
const ALLOW_METHODS: &str = "GET,OPTIONS";
const NO_STORE: &str = "no-cache, no-store, must-revalidate";

fn status_headers() -> [(HeaderName, &'static str); 4] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        (header::CACHE_CONTROL, NO_STORE),
    ]
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// stopped | pending | initializing | running | stopping | not_found | raw provider state
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    pub status_checks: StatusChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<DateTime<Utc>>,
    pub message: String,
}

impl From<StatusReport> for StatusResponse {
    fn from(r: StatusReport) -> Self {
        Self {
            status: r.status.to_string(),
            instance_id: r.instance_id,
            public_ip: r.public_ip,
            status_checks: r.status_checks,
            launch_time: r.launch_time,
            message: r.message,
        }
    }
}

#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Current instance status", body = StatusResponse),
        (status = 500, description = "Status could not be determined", body = serde_json::Value)
    )
)]
pub async fn get_status(State(state): State<Arc<AppState>>) -> Response {
    let report = state
        .services
        .status()
        .instrument(logger::invocation_span("status"))
        .await;

    if report.is_error() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            status_headers(),
            Json(json!({ "status": "error", "message": ERROR_MESSAGE })),
        )
            .into_response();
    }
    (StatusCode::OK, status_headers(), Json(StatusResponse::from(report))).into_response()
}

/// CORS preflight. No reconciliation.
pub async fn status_preflight() -> Response {
    (StatusCode::OK, status_headers(), Json(json!({}))).into_response()
}
