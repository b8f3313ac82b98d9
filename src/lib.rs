pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{not_found, relay::relay_handler, sse::sse_handler};
use crate::state::AppState;

pub const BANNER: &str = "MCP storefront relay running";

pub fn build_router(state: Arc<AppState>) -> Router {
    // Method mismatches fall through to 404 like unknown paths do.
    Router::new()
        .route("/", get(|| async { BANNER }).fallback(not_found))
        .route("/health", get(|| async { "OK" }).fallback(not_found))
        .route("/mcp", post(relay_handler).fallback(not_found))
        .route("/mcp/sse", get(sse_handler).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
