#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

use echopod_handler::{CommandLoader, HandlerConfig, ModelHandle, WorkerState, cache, serve};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HandlerConfig::from_env();
    let cache_dir = cache::locate_writable_cache_dir();
    let loader = CommandLoader::from_env()?;

    tracing::info!(
        cache_dir = ?cache_dir,
        default_temperature = config.default_temperature,
        default_top_p = config.default_top_p,
        "starting worker"
    );

    let model = ModelHandle::new(Box::new(loader), cache_dir);
    let state = WorkerState::new(model, config);

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    serve(state, shutdown).await?;

    tracing::info!("worker stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
