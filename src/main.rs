//! tixly server entry point.
//!
//! Loads configuration, opens the stores and serves the REST and
//! WebSocket endpoints until Ctrl+C or SIGTERM.

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use tixly::app_state::AppState;
use tixly::config::{LogFormat, TixlyConfig};
use tixly::persistence::Stores;
use tixly::server::build_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config =
        TixlyConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting tixly");

    let stores = Stores::from_config(&config)
        .await
        .context("failed to open stores")?;

    let listen_addr = config.listen_addr;
    let state = AppState::new(config, stores).await;
    let session = std::sync::Arc::clone(&state.session);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
