use std::sync::Arc;

use tracing::{error, info};

use mcp_storefront_bridge::build_router;
use mcp_storefront_bridge::config::{Config, ENV_PREFIX};
use mcp_storefront_bridge::error::BridgeError;
use mcp_storefront_bridge::state::AppState;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    let log_level = std::env::var(format!("{ENV_PREFIX}_LOG")).unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = Config::from_env().inspect_err(|e| error!("❌ {}", e))?;

    let state = Arc::new(AppState::new(&config)?);
    let app = build_router(state);

    let addr = config.listen_addr();
    info!(
        "🚀 MCP storefront bridge started on {} relaying to {}",
        addr, config.upstream_url
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
