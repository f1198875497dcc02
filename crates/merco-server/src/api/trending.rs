use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use merco_trending::TriggerSource;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct AcceptedData {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    id: i64,
    public_id: Uuid,
    trigger_source: String,
    status: String,
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    line_items_seen: i64,
    products_updated: i64,
    shops_updated: i64,
    products_skipped: i64,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

/// Spawns a recompute run in the background, detached from the request.
///
/// The caller never sees the run result; outcomes land on the run's
/// `trending_runs` row and in the logs. Overlap with an in-flight run is
/// resolved by the run lock.
pub(super) fn spawn_run(state: &AppState, trigger: TriggerSource) {
    let pool = state.pool.clone();
    let window_days = state.config.trending_window_days;

    tokio::spawn(async move {
        if let Err(e) = merco_trending::execute_run(&pool, trigger, window_days).await {
            tracing::error!(error = %e, %trigger, "trending: background run failed");
        }
    });
}

/// Manual probe trigger. Fire-and-forget: responds `202 Accepted`
/// immediately and lets the run proceed in the background.
pub(super) async fn trigger_recompute(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl axum::response::IntoResponse {
    spawn_run(&state, TriggerSource::Probe);

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: AcceptedData { status: "accepted" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

/// Lists recent recompute runs, newest first.
pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunItem>>>, ApiError> {
    let rows = merco_db::list_trending_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| RunItem {
            id: row.id,
            public_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            window_start: row.window_start,
            window_end: row.window_end,
            started_at: row.started_at,
            completed_at: row.completed_at,
            line_items_seen: row.line_items_seen,
            products_updated: row.products_updated,
            shops_updated: row.shops_updated,
            products_skipped: row.products_skipped,
            error_message: row.error_message,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
