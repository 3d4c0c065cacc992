//! HTTP server command handler.

use std::net::SocketAddr;

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::http;

use super::App;

impl App {
    /// Run the storefront API.
    pub async fn run_serve(&self, host: Option<String>, port: Option<u16>) -> Result<()> {
        tracing::info!("Starting graphmart HTTP server");

        let config = Config::load()?;
        let host = host.unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);

        let ctx = Context::connect(config).await?;
        ctx.schema.ensure_schema().await?;

        let app = http::router(ctx);

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("graphmart listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                color_eyre::eyre::eyre!("HTTP server error: {}", e)
            })?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
