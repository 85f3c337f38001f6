//! Process entry point for the node task dispatcher (§4.5 Bootstrap).
//!
//! Loads configuration, opens and migrates the store, wires the HTTP
//! server, and runs until `SIGINT`/`SIGTERM` request graceful shutdown.
//! Exit code 0 on clean shutdown, 1 on any startup failure (§6).

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use dispatch_auth::Keys;
use dispatch_core::Scheduler;
use dispatch_store::{Database, SqliteStore};
use dispatch_web::{WebConfig, WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        listen_addr = %config.listen_addr,
        database_name = %config.database_name,
        "starting dispatcher"
    );

    let db = Database::open_and_migrate(config.database_path.clone())
        .await
        .context("failed to open store")?;
    info!(path = %config.database_path, "store initialized");

    let store = Arc::new(SqliteStore::new(db));
    let scheduler = Scheduler::new(store);
    let keys = Keys::new(config.admin_api_key.clone(), config.nodes_api_key.clone());

    let server = WebServer::new(
        WebConfig {
            listen_addr: config.listen_addr.clone(),
        },
        scheduler,
        keys,
    );

    server
        .start_with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with an error")?;

    info!("dispatcher shut down cleanly");
    Ok(())
}

/// Initialize the tracing subscriber, honoring `RUST_LOG` if set.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
