//! # Shopfloor Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Server                                 │
//! │                                                                         │
//! │  Tills / back office ───► HTTP (8080) ───► Handlers ───► SQLite        │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                     barcode SVGs, receipt spool         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! shopfloor-server                       # default config location
//! shopfloor-server --config ./shop.toml
//! RUST_LOG=debug SHOPFLOOR_PORT=9000 shopfloor-server
//! ```

use std::path::PathBuf;

use anyhow::Context;
use shopfloor_db::Database;
use shopfloor_server::{router, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,shopfloor=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Shopfloor server...");

    // Load configuration
    let config = ServerConfig::load(config_arg()).context("Failed to load configuration")?;
    info!(
        address = %config.bind_address(),
        db = %config.database.path.display(),
        store = %config.store.name,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    let state = AppState::new(db.clone(), config).into_shared();
    let app = router(state);

    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `--config <path>` / `-c <path>` from the command line.
fn config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => return args.next().map(PathBuf::from),
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }
    None
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
