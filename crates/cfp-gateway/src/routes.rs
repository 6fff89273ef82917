//! Trigger handlers invoked by the functions host.

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use cfp_core::response::{Disposition, InvocationResponse, TIMER_TIME_FORMAT};
use chrono::Datelike;
use std::sync::Arc;

use super::server::AppState;

/// Header the host stamps on every invocation.
pub const INVOCATION_ID_HEADER: &str = "X-Azure-Functions-InvocationId";

pub const SIMPLE_HTTP_PATH: &str = "/api/SimpleHttpTrigger";

pub const CHANGE_FEED_PATHS: [&str; 4] = [
    "/api/cosmosChangeTrigger",
    "/cosmosChangeTrigger",
    "/Functions.cosmosChangeTrigger",
    "/api/Functions.cosmosChangeTrigger",
];

pub const TIMER_PATHS: [&str; 6] = [
    "/api/timerTrigger",
    "/timerTrigger",
    "/api/TimerTrigger",
    "/TimerTrigger",
    "/Functions.timerTrigger",
    "/api/Functions.timerTrigger",
];

pub const HELLO_BODY: &str = "Hello World from go worker";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// HTTP-triggered function. Logs request details and greets.
pub async fn simple_http_trigger(
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> &'static str {
    let now = chrono::Local::now();
    tracing::info!("{} {} {}", now.format("%B"), now.day(), now.year());
    tracing::info!("user agent is: {}", header_str(&headers, header::USER_AGENT.as_str()));
    tracing::info!("invocationid is: {}", header_str(&headers, INVOCATION_ID_HEADER));

    for (k, v) in &params {
        tracing::info!("k: {k} v: {v}");
    }

    HELLO_BODY
}

/// Change-feed triggered function. A `500` asks the host to redeliver the batch.
pub async fn cosmos_change_trigger(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("cosmos error=read_body_failed err={e}");
            Bytes::new()
        }
    };

    let invocation_id = headers
        .get(INVOCATION_ID_HEADER)
        .and_then(|v| v.to_str().ok());

    let batch = state.processor.process(&body, invocation_id).await;
    let status = match batch.disposition {
        Disposition::Success => StatusCode::OK,
        Disposition::Retry => StatusCode::INTERNAL_SERVER_ERROR,
    };

    json_response(status, &batch.response)
}

/// Timer-triggered function. Logs the tick and acknowledges it.
pub async fn timer_trigger(method: Method, uri: Uri, headers: HeaderMap) -> Response {
    tracing::info!("Timer trigger handler called: {} {}", method, uri.path());
    let now = chrono::Local::now();
    let executed_at = now.format(TIMER_TIME_FORMAT).to_string();
    tracing::info!("Timer trigger executed at: {executed_at}");
    tracing::info!("Current timestamp: {}", now.timestamp());

    let invocation_id = header_str(&headers, INVOCATION_ID_HEADER);
    if !invocation_id.is_empty() {
        tracing::info!("Timer trigger invocation ID: {invocation_id}");
    }

    tracing::info!("Headers:");
    for (name, value) in &headers {
        tracing::info!("  {}: {:?}", name, value);
    }

    json_response(StatusCode::OK, &InvocationResponse::timer(&executed_at))
}

/// Anything the host sends to a path we don't serve.
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, String) {
    tracing::warn!("Unhandled request: {} {}", method, uri.path());
    (StatusCode::NOT_FOUND, format!("Path not found: {}", uri.path()))
}

/// Serialize an invocation response; serialization failure answers `500` with no body.
fn json_response(status: StatusCode, response: &InvocationResponse) -> Response {
    match response.to_json() {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!("Error marshaling response: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
