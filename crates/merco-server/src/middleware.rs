//! HTTP plumbing for the trigger surface: request tagging, bearer-key
//! checks, and a cooldown guard on the recompute triggers.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id carried through extensions and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags every request with an id: the caller's `x-request-id` when present,
/// a fresh UUID otherwise.
pub async fn tag_request(mut req: Request, next: Next) -> Response {
    let id = match req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(existing) => existing.to_owned(),
        None => Uuid::new_v4().to_string(),
    };
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::try_from(id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Bearer-key policy for the protected routes.
///
/// Keys come from `MERCO_API_KEYS` as a comma-separated list. Outside
/// development the list must be non-empty; in development an empty list
/// switches the check off for local work.
#[derive(Debug, Clone)]
pub enum ApiKeys {
    Open,
    Keyed(Arc<HashSet<String>>),
}

impl ApiKeys {
    pub fn from_env(env: &merco_core::Environment) -> anyhow::Result<Self> {
        let keys = parse_key_list(&std::env::var("MERCO_API_KEYS").unwrap_or_default());
        if !keys.is_empty() {
            return Ok(Self::Keyed(Arc::new(keys)));
        }
        if matches!(env, merco_core::Environment::Development) {
            tracing::warn!("MERCO_API_KEYS is empty; protected routes are open in development");
            return Ok(Self::Open);
        }
        anyhow::bail!("MERCO_API_KEYS must list at least one bearer key in {env}")
    }

    fn admits(&self, authorization: Option<&HeaderValue>) -> bool {
        match self {
            Self::Open => true,
            Self::Keyed(keys) => authorization
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .is_some_and(|token| keys.contains(token.trim())),
        }
    }
}

fn parse_key_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub async fn check_api_key(State(keys): State<ApiKeys>, req: Request, next: Next) -> Response {
    if keys.admits(req.headers().get(AUTHORIZATION)) {
        next.run(req).await
    } else {
        reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer key",
        )
    }
}

/// Minimum spacing between accepted trigger requests.
///
/// Recompute triggers are fire-and-forget and already serialized by the
/// database run lock; requests arriving faster than the gap would only pile
/// up skipped runs, so they are turned away at the edge instead.
#[derive(Clone)]
pub struct TriggerCooldown {
    min_gap: Duration,
    last_accepted: Arc<Mutex<Option<Instant>>>,
}

impl TriggerCooldown {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_accepted: Arc::new(Mutex::new(None)),
        }
    }

    async fn admit(&self) -> bool {
        let mut last = self.last_accepted.lock().await;
        if last.is_some_and(|at| at.elapsed() < self.min_gap) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }
}

pub async fn throttle_triggers(
    State(cooldown): State<TriggerCooldown>,
    req: Request,
    next: Next,
) -> Response {
    if cooldown.admit().await {
        next.run(req).await
    } else {
        reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "a trigger was accepted moments ago; retry shortly",
        )
    }
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = serde_json::json!({ "error": { "code": code, "message": message } });
    (status, Json(body)).into_response()
}
