//! billkit — billing-document PDF rendering and delivery service.

mod error;
mod payload;
mod routes;
mod state;

use crate::error::{ErrorKind, Result};
use crate::state::AppState;
use billkit_config::AppConfig;
use exn::ResultExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "server terminated");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => exn::bail!(ErrorKind::Config(err.to_string())),
    };
    // The static output directory is served by the router; make sure it
    // exists before the first request needs it.
    tokio::fs::create_dir_all(&config.storage.output_dir).await.or_raise(|| ErrorKind::Io)?;

    let port = config.server.port;
    let public_base = config.server.public_base();
    let state = AppState::new(config)?;
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => exn::bail!(ErrorKind::Bind(port, err.to_string())),
    };
    tracing::info!(port, public_base = %public_base, "billkit server listening");
    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        exn::bail!(ErrorKind::Serve(err.to_string()));
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
