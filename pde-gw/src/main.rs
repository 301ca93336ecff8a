//! pde-gw - PD ensemble gateway
//!
//! Serves ensemble scoring over HTTP and runs the background weight refresh.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pde_gw::config::{Args, GatewayConfig};
use pde_gw::{build_router, Gateway};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pde_gw=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting PDE gateway (pde-gw) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = GatewayConfig::load(Args::parse()).context("Failed to load configuration")?;
    info!("Model A: {} (flavor {})", config.model_a.url, config.model_a.flavor);
    info!("Model B: {} (flavor {})", config.model_b.url, config.model_b.flavor);
    info!(
        "Default strategy: {}, refresh every {}s",
        config.default_strategy,
        config.refresh_interval.as_secs()
    );

    let gateway = Gateway::from_config(&config).context("Failed to create model clients")?;

    let cancel = CancellationToken::new();
    let refresh_task = gateway.scheduler.spawn(cancel.clone());

    let app = build_router(gateway.app_state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("pde-gw listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel.cancel();
    refresh_task.await.context("Refresh task panicked")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
