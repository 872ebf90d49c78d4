// Lifecycle and scheduled triggers for the address binder.
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ondemand_common::LifecycleEvent;
use ondemand_orchestrator::address_binder::BindReport;
use ondemand_orchestrator::logger;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use crate::app::AppState;

pub const BIND_OK_MESSAGE: &str = "EIP association successful";
pub const NOTHING_TO_BIND_MESSAGE: &str = "No instances to associate EIP with";
pub const BIND_ERROR_MESSAGE: &str = "Error associating EIP";
pub const SCHEDULED_ERROR_MESSAGE: &str = "Error processing scheduled event";

#[utoipa::path(
    post,
    path = "/events/lifecycle",
    request_body = LifecycleEvent,
    responses(
        (status = 200, description = "Address bound (or nothing to bind)", body = String),
        (status = 400, description = "Malformed event", body = String),
        (status = 500, description = "Binding failed", body = String)
    )
)]
pub async fn lifecycle_event(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let event: LifecycleEvent = if body.iter().all(u8::is_ascii_whitespace) {
        LifecycleEvent::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(e) => e,
            Err(e) => {
                warn!("[API] Invalid lifecycle event payload: {}", e);
                return (StatusCode::BAD_REQUEST, "Invalid event payload").into_response();
            }
        }
    };

    let Some(instance_id) = event.instance_id().map(str::to_string) else {
        return bind_scheduled(&state)
            .instrument(logger::invocation_span("lifecycle"))
            .await;
    };

    let result = state
        .services
        .bind_address(Some(&instance_id))
        .instrument(logger::invocation_span("lifecycle"))
        .await;
    match result {
        Ok(_) => {
            info!("[API] EIP association successful for {}", instance_id);
            (StatusCode::OK, BIND_OK_MESSAGE).into_response()
        }
        Err(e) => {
            error!(kind = e.kind(), "[API] Error associating EIP: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, BIND_ERROR_MESSAGE).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/events/scheduled",
    responses(
        (status = 200, description = "Address bound (or nothing to bind)", body = String),
        (status = 500, description = "Binding failed", body = String)
    )
)]
pub async fn scheduled_event(State(state): State<Arc<AppState>>) -> Response {
    bind_scheduled(&state)
        .instrument(logger::invocation_span("schedule"))
        .await
}

async fn bind_scheduled(state: &AppState) -> Response {
    match state.services.bind_address(None).await {
        Ok(BindReport::NothingToBind) => (StatusCode::OK, NOTHING_TO_BIND_MESSAGE).into_response(),
        Ok(BindReport::Bound { instance_id, .. }) => (
            StatusCode::OK,
            format!("Associated EIP with instance {}", instance_id),
        )
            .into_response(),
        Err(e) => {
            error!(kind = e.kind(), "[API] Error processing scheduled event: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, SCHEDULED_ERROR_MESSAGE).into_response()
        }
    }
}
