//! Bridge HTTP server.
//!
//! Builds the registry from a `BridgeConfig` and serves the router until the
//! shutdown future resolves.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::config::{BridgeConfig, TOKEN_ENV};
use crate::create_registry;

/// Bind `config.bind` and serve until Ctrl-C.
pub async fn serve(config: BridgeConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    serve_with_listener(listener, config, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// In-flight requests are allowed to finish once shutdown begins.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    config: BridgeConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = create_registry(&config)?;

    match &config.token {
        Some(token) => info!("Vercel token configured ({})", token.masked()),
        None => warn!(
            "{} is not set; upstream tools will fail until set_credential is called",
            TOKEN_ENV
        ),
    }
    info!(
        tools = registry.len(),
        api = %config.api_base_url,
        "Tool registry ready"
    );

    let app = create_router(Arc::new(registry), &config);
    let addr = listener.local_addr()?;
    info!("Bridge server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Bridge server failed")?;

    info!("Bridge server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
