/**
 * API HTTP VIGIL COLLECTOR - Réception des statuts des reporters
 *
 * RÔLE :
 * Reçoit les rapports `status=running|stopped` (form-urlencoded) et
 * expose le dernier statut connu. Seul le drapeau de statut est conservé.
 *
 * ROUTES :
 * - POST /log/status : enregistre un statut (dernier écrit gagne)
 * - GET  /status     : dernier statut + fraîcheur
 * - GET  /health     : "ok"
 */

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use crate::config::CollectorConfig;
use crate::models::{CollectedStatus, StatusIn, StatusRecord};
use crate::state::{Shared, StatusBoard};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, serde::Serialize)]
struct StatusView {
    status: CollectedStatus,
    last_seen: String,        // format RFC3339 pour l'API
    stale: bool,              // true si > stale_after_secs
    stale_for_seconds: i64,   // âge en secondes
    reports_received: u64,
}

fn to_view(rec: &StatusRecord, reports_received: u64, stale_after_secs: i64) -> StatusView {
    let age = OffsetDateTime::now_utc() - rec.last_seen;
    StatusView {
        status: rec.status,
        last_seen: rec.last_seen.format(&Rfc3339).unwrap_or_default(),
        stale: age > Duration::seconds(stale_after_secs),
        stale_for_seconds: age.whole_seconds().max(0),
        reports_received,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub board: Shared<StatusBoard>,
    pub cfg: CollectorConfig,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/log/status", post(receive_status))
        .route("/status", get(get_status))
        .with_state(app_state)
}

// POST /log/status
async fn receive_status(
    State(app): State<AppState>,
    Form(form): Form<StatusIn>,
) -> (StatusCode, String) {
    match form.status.parse::<CollectedStatus>() {
        Ok(status) => {
            app.board.lock().record(status, OffsetDateTime::now_utc());
            tracing::info!(?status, "📡 status received");
            (StatusCode::OK, "Status received".to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected status report");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

// GET /status
async fn get_status(State(app): State<AppState>) -> Result<Json<StatusView>, StatusCode> {
    let board = app.board.lock();
    let Some(rec) = board.latest() else { return Err(StatusCode::NOT_FOUND); };
    Ok(Json(to_view(rec, board.received(), app.cfg.stale_after_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::new_state;
    use serde_json::Value;
    use tokio::net::TcpListener;

    async fn spawn_app() -> String {
        let app_state = AppState {
            board: new_state(StatusBoard::default()),
            cfg: CollectorConfig::default(),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(app_state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn post_status(base: &str, value: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{base}/log/status"))
            .form(&[("status", value)])
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_app().await;
        let body = reqwest::get(format!("{base}/health")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_status_not_found_before_first_report() {
        let base = spawn_app().await;
        let resp = reqwest::get(format!("{base}/status")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_last_report_wins() {
        let base = spawn_app().await;

        let resp = post_status(&base, "running").await;
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "Status received");
        post_status(&base, "stopped").await;

        let body = reqwest::get(format!("{base}/status")).await.unwrap().text().await.unwrap();
        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["status"], "stopped");
        assert_eq!(view["reports_received"], 2);
        assert_eq!(view["stale"], false);
        assert!(view["last_seen"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let base = spawn_app().await;
        let resp = post_status(&base, "maybe").await;
        assert_eq!(resp.status().as_u16(), 422);

        let resp = reqwest::get(format!("{base}/status")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 404);
    }
}
