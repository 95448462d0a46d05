//! Scheduled invocation gate
//!
//! Middleware that runs in front of every route. Requests that come from the
//! scheduler trigger a relay cycle and are answered here; all other requests
//! continue to the router with their body intact.

use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use logrelay_core::invocation::Invocation;
use serde_json::Value;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// Largest request body the gate will buffer
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Headers the classifier looks at
const INSPECTED_HEADERS: [&str; 2] = ["referer", "if-none-match"];

pub async fn scheduled_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    // Bodies declared larger than the limit are never buffered; only the
    // headers can mark such a request as scheduled
    if declared_length(req.headers()).is_some_and(|len| len > MAX_BODY_BYTES as u64) {
        if !invocation_from(req.headers(), &Bytes::new()).is_scheduled_run() {
            return next.run(req).await;
        }
        tracing::info!("Scheduled invocation on {}", req.uri());
        return run(&state).await.into_response();
    }

    let (parts, body) = req.into_parts();

    // Only streamed bodies without a length can overrun the limit here
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::BadRequest(format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    if !invocation_from(&parts.headers, &bytes).is_scheduled_run() {
        return next.run(Request::from_parts(parts, Body::from(bytes))).await;
    }

    tracing::info!("Scheduled invocation on {}", parts.uri);

    run(&state).await.into_response()
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

async fn run(state: &AppState) -> ApiResult<impl IntoResponse> {
    let result = state.scheduled.execute().await?;
    Ok(Json(result))
}

/// Builds the invocation seen by the classifier
///
/// Bodies that are empty or not JSON are treated as `null`.
fn invocation_from(headers: &HeaderMap, body: &Bytes) -> Invocation {
    let body = serde_json::from_slice(body).unwrap_or(Value::Null);

    INSPECTED_HEADERS
        .iter()
        .fold(Invocation::new(body), |invocation, name| {
            match headers.get(*name).and_then(|v| v.to_str().ok()) {
                Some(value) => invocation.with_header(name, value),
                None => invocation,
            }
        })
}
