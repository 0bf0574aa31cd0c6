/**
 * VIGIL COLLECTOR - Point d'entrée du collector de statuts
 *
 * RÔLE : Reçoit les rapports périodiques des reporters (running/stopped)
 * et expose le dernier statut connu via HTTP.
 *
 * ARCHITECTURE : Axum + état partagé (dernier écrit gagne), pas de persistance.
 */

mod config;
mod http;
mod models;
mod state;

use crate::config::load_config;
use crate::http::AppState;
use crate::state::{new_state, StatusBoard};

use anyhow::{Context, Result};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vigil_collector=info".to_string()),
        )
        .init();

    let cfg = load_config().await;
    let app_state = AppState {
        board: new_state(StatusBoard::default()),
        cfg: cfg.clone(),
    };

    let app = http::build_router(app_state);

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind))?;
    tracing::info!("[collector] listening on http://{}", cfg.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

// Arrêt propre sur Ctrl-C ou SIGTERM (process manager)
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
    tracing::info!("[collector] shutdown signal received");
}
