use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;

use merco_trending::TriggerSource;

use crate::middleware::RequestId;

use super::{trending::spawn_run, ApiError, ApiResponse, AppState, ResponseMeta};

/// Inbound event envelope.
///
/// The transport delivers at-least-once, and the payload carries whatever
/// the producing subsystem put there — receipt alone triggers a recompute,
/// so the payload is validated as JSON and then ignored. Duplicate
/// deliveries fall into the run lock and are skipped.
#[derive(Debug, Deserialize)]
pub(super) struct EventEnvelope {
    pub event_type: String,
    #[serde(default)]
    #[allow(dead_code)] // accepted and discarded; documents the wire shape
    pub payload: serde_json::Value,
}

/// Message-driven trigger: any well-formed event fires a background run.
pub(super) async fn receive_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(envelope): Json<EventEnvelope>,
) -> Result<(StatusCode, Json<ApiResponse<&'static str>>), ApiError> {
    if envelope.event_type.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "event_type must not be empty",
        ));
    }

    tracing::info!(event_type = %envelope.event_type, "event received; triggering trending run");
    spawn_run(&state, TriggerSource::Event);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: "accepted",
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
