//! # QLStats Ranking Bridge
//!
//! HTTP server that answers ranking queries for one, many or all QLStats
//! ranked game servers by fanning out to the QLStats API and merging the
//! per-server answers.
//!
//! ## Endpoints:
//! - `GET /rankings?servers=ip:port,...`
//! - `GET /allrankings`
//! - `GET /rankedservers`
//!
//! ## Configuration:
//! Defaults, then `server_qlsbridge.conf` (JSON), then `QLSBRIDGE_*`
//! environment variables and command-line flags. `.env` files are loaded
//! first. See `--help`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use lib_qlsbridge::QlStatsApi;
use lib_qlsbridge::loggers::{LoggerLocalOptions, setup_logging};
use servers::bridge_logic::config::ConfigError;
use servers::bridge_logic::{AppState, RouterOptions, build_router, load_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up environment variables
    dotenvy::dotenv().ok();

    let settings = match load_config() {
        Ok(settings) => settings,
        // Prints help/version or the usage error and exits.
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let _log_guard = setup_logging(&LoggerLocalOptions {
        app_name: "server_qlsbridge".to_string(),
        log_dir: settings.log_dir.clone(),
        log_level: settings.log_level.clone(),
        use_tty: true,
    })
    .context("Failed to initialize logging")?;

    info!(
        "QLStats bridge starting: upstream {}, deadline {:?}, gzip {}",
        settings.api_base_url, settings.deadline, settings.gzip
    );

    let api = QlStatsApi::new(&settings.api_base_url).context("Invalid QLStats API base URL")?;
    let app = build_router(
        AppState::new(Arc::new(api)),
        RouterOptions {
            deadline: settings.deadline,
            gzip: settings.gzip,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind HTTP server to {}", addr))?;
    info!("QLStats bridge listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("QLStats bridge stopped");
    Ok(())
}

/// Resolves on `CTRL+C` or, on UNIX, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    // On non-UNIX systems, `terminate` is a future that never completes.
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Shutdown signal received. Closing server gracefully...");
}
