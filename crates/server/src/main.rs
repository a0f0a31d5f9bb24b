// crates/server/src/main.rs
//! Docbridge server binary.
//!
//! Clears the work directory, then serves the conversion API until Ctrl-C or
//! SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use docbridge_core::files::prepare_work_dir;
use docbridge_observability::init_tracing;
use docbridge_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    // Keep the guard alive so the file writer flushes on exit.
    let _log_guard = init_tracing(&config.log_config()).context("Failed to initialize logging")?;

    let purge = prepare_work_dir(&config.work_dir).with_context(|| {
        format!("Failed to prepare work directory {}", config.work_dir.display())
    })?;
    tracing::info!(
        work_dir = %config.work_dir.display(),
        removed = purge.removed.len(),
        failed = purge.failed.len(),
        "Work directory ready"
    );

    let state = AppState::from_config(&config);
    tracing::info!(
        renderer = state.worker.renderer().name(),
        converter = state.worker.converter().name(),
        max_upload_bytes = state.max_upload_bytes,
        "Conversion engines configured"
    );
    let app = create_app(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "Starting server");
    eprintln!("\n  docbridge v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  \u{2192} http://{}\n", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
