//! Vigil Reporter - status reporting daemon
//!
//! Loads the reporter config, takes the execution grant and reports
//! `running` every interval until SIGINT/SIGTERM, then sends `stopped`.

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::info;
use vigil_reporter::{LifecycleController, PidFileGrant, Reporter, ReporterConfig, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vigil_reporter=info".to_string()),
        )
        .init();

    info!("📡 Vigil Reporter starting...");

    let config = ReporterConfig::load()
        .await
        .context("Failed to load reporter configuration")?;
    let reporter = Reporter::new(&config).context("Failed to build HTTP client")?;
    let grant = PidFileGrant::new(config.grant_path());
    let scheduler = Scheduler::new(Handle::current());

    let controller = LifecycleController::new(config, reporter, grant, scheduler);
    controller
        .start()
        .context("Failed to start status reporting")?;

    shutdown_signal().await;
    info!("shutdown signal received");

    controller.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
}
