use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::mcp::{McpErrorResponse, PARSE_ERROR, PROXY_ERROR};

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Render as a JSON-RPC error envelope answering the request `id`.
    pub fn into_rpc_response(self, id: Value) -> Response {
        let (status, code, message) = match &self {
            Self::InvalidJson(_) => (StatusCode::BAD_REQUEST, PARSE_ERROR, "Parse error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, PROXY_ERROR, "Proxy Error"),
        };
        let body = McpErrorResponse::new(id, code, message, self.detail());
        (status, Json(body)).into_response()
    }

    /// The underlying failure, without the variant prefix.
    fn detail(&self) -> String {
        match self {
            Self::Network(e) => e.to_string(),
            Self::Encode(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Upstream(msg)
            | Self::InvalidJson(msg)
            | Self::Config(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        self.into_rpc_response(Value::from(0))
    }
}
