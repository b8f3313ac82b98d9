use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::error::BridgeError;

pub struct AppState {
    pub upstream_url: String,
    pub client: reqwest::Client,
    pub heartbeat_interval: Duration,
    live_sessions: AtomicUsize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        // No request timeout: a relayed call waits as long as the transport does.
        let client = reqwest::Client::builder()
            .user_agent(concat!("MCP-Storefront-Bridge/", env!("CARGO_PKG_VERSION")))
            .http1_only()
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            upstream_url: config.upstream_url.clone(),
            client,
            heartbeat_interval: config.heartbeat_interval,
            live_sessions: AtomicUsize::new(0),
        })
    }

    /// Number of heartbeat streams currently open.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    pub(crate) fn session_opened(&self) -> usize {
        self.live_sessions.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn session_closed(&self) -> usize {
        self.live_sessions.fetch_sub(1, Ordering::SeqCst) - 1
    }
}
