use std::sync::Arc;

use trade_assist::adapters::http::{build_router, ChatHandlers};
use trade_assist::bootstrap::{build_orchestrator, init_tracing};
use trade_assist::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return Err(e.into());
    }

    let orchestrator = build_orchestrator(&config).await.map_err(|e| {
        tracing::error!(error = %e, "startup failed");
        e
    })?;
    let app = build_router(ChatHandlers::new(Arc::new(orchestrator)), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "trade-assist listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
