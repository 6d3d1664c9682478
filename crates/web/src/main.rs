//! s3desk - web file manager for S3-compatible object storage
//!
//! Serves a browser UI for buckets, folders and objects on any S3-compatible
//! backend.

use std::sync::Arc;

use clap::Parser;
use s3desk::args::Cli;
use s3desk::{AppState, create_router};
use s3desk_core::Explorer;
use s3desk_s3::S3Client;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.default_log_filter().into()),
        )
        .init();

    let config = cli.load_config()?;

    let client = S3Client::new(&config.storage).await?;
    info!(
        endpoint = config.storage.endpoint.as_deref().unwrap_or("aws"),
        region = %config.storage.region,
        "storage client configured"
    );

    let explorer = Explorer::new(Arc::new(client));
    let state = AppState::new(explorer, config.server.session_secret.as_deref())?;
    let app = create_router(state, config.server.max_upload_bytes);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
