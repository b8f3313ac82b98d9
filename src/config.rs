use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::BridgeError;

/// Prefix shared by every environment variable the bridge reads.
pub const ENV_PREFIX: &str = "MCP_RELAY";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HEARTBEAT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub upstream_url: String,
    pub port: u16,
    pub heartbeat_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}_{suffix}")).filter(|v| !v.trim().is_empty())
        };

        let upstream_url = var("URL")
            .or_else(|| lookup("SHOPIFY_MCP_URL").filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| BridgeError::Config(format!("missing {ENV_PREFIX}_URL")))?;
        let parsed = reqwest::Url::parse(upstream_url.trim())
            .map_err(|e| BridgeError::Config(format!("invalid upstream URL {upstream_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BridgeError::Config(format!(
                "upstream URL must be http(s), got {:?}",
                parsed.scheme()
            )));
        }

        let port = match var("PORT").or_else(|| lookup("PORT")) {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|e| BridgeError::Config(format!("invalid port {p:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let heartbeat_secs = match var("HEARTBEAT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    BridgeError::Config(format!("invalid heartbeat interval {s:?}"))
                })?,
            None => DEFAULT_HEARTBEAT_SECS,
        };

        Ok(Self {
            upstream_url: upstream_url.trim().to_string(),
            port,
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
