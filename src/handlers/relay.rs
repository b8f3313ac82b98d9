use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::error::BridgeError;
use crate::mcp::{reshape_result_content, McpRequest};
use crate::state::AppState;

/// `POST /mcp`: one inbound envelope, one upstream call, one reply.
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let mut request = match parse_envelope(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(src = %client_ip, "rejecting inbound body: {}", e);
            return e.into_rpc_response(Value::from(0));
        }
    };
    let id = request.response_id();
    let method = request.method().unwrap_or_default().to_string();

    // Untouched payloads, batches included, go out exactly as they came in.
    let outbound = if request.apply_default_context() {
        info!(method = %method, "injected default search context");
        match serde_json::to_vec(&request) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => return BridgeError::from(e).into_rpc_response(id),
        }
    } else {
        body
    };

    let start = Instant::now();
    let result = forward_to_upstream(&state, outbound).await;
    let backend_ms = start.elapsed().as_millis();

    match result {
        Ok((status, mut data)) => {
            let reshaped = reshape_result_content(&mut data);
            info!(
                target: "mcp_access_log",
                "src={} method=\"{}\" upstream_status={} backend_ms={} reshaped={} status=relayed",
                client_ip, method, status, backend_ms, reshaped
            );
            (StatusCode::OK, Json(data)).into_response()
        }
        Err(e) => {
            error!(
                target: "mcp_access_log",
                "src={} method=\"{}\" backend_ms={} status=failed error=\"{}\"",
                client_ip, method, backend_ms, e
            );
            e.into_rpc_response(id)
        }
    }
}

fn parse_envelope(body: &[u8]) -> Result<McpRequest, BridgeError> {
    serde_json::from_slice::<Value>(body)
        .map(McpRequest::from)
        .map_err(|e| BridgeError::InvalidJson(e.to_string()))
}

/// Single POST to the upstream endpoint. Non-2xx replies are still relayed
/// as long as their body is JSON.
#[instrument(skip(state, body), fields(upstream = %state.upstream_url, bytes = body.len()))]
pub async fn forward_to_upstream(
    state: &AppState,
    body: Bytes,
) -> Result<(reqwest::StatusCode, Value), BridgeError> {
    let resp = state
        .client
        .post(&state.upstream_url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%status, "upstream returned non-success status");
    }

    let raw = resp.bytes().await?;
    let data = serde_json::from_slice(&raw).map_err(|e| {
        BridgeError::Upstream(format!("invalid json response body from upstream: {e}"))
    })?;
    Ok((status, data))
}
