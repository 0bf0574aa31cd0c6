/*!
Mock Collector pour tests sans serveur réel

Serveur HTTP local (port éphémère) qui accepte `POST /log/status`,
enregistre chaque rapport reçu et répond selon un comportement scripté.
*/

use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const STATUS_PATH: &str = "/log/status";

/// Réponse du mock à chaque rapport
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Répond immédiatement avec ce code HTTP
    Respond(u16),
    /// Attend avant de répondre 200 (simule un collector bloqué)
    Delay(Duration),
}

/// Un rapport tel que reçu par le mock
#[derive(Debug, Clone)]
pub struct ReceivedReport {
    pub status: String,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    received: Arc<Mutex<Vec<ReceivedReport>>>,
}

pub struct MockCollector {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedReport>>>,
    server: JoinHandle<()>,
}

impl MockCollector {
    /// Démarre le mock sur 127.0.0.1 avec un port libre
    pub async fn start(behavior: Behavior) -> anyhow::Result<Self> {
        crate::test_utils::init_logging();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(STATUS_PATH, post(receive_status))
            .with_state(MockState {
                behavior,
                received: received.clone(),
            });

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("mock collector stopped: {}", e);
            }
        });

        log::info!("🧪 Mock collector listening on {} ({:?})", addr, behavior);
        Ok(Self { addr, received, server })
    }

    /// URL complète de l'endpoint status (http, à utiliser avec allow_insecure_http)
    pub fn status_url(&self) -> String {
        format!("http://{}{}", self.addr, STATUS_PATH)
    }

    pub fn received(&self) -> Vec<ReceivedReport> {
        self.received.lock().clone()
    }

    /// Statuts reçus, dans l'ordre d'arrivée
    pub fn statuses(&self) -> Vec<String> {
        self.received.lock().iter().map(|r| r.status.clone()).collect()
    }
}

impl Drop for MockCollector {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn receive_status(
    State(state): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<StatusForm>,
) -> StatusCode {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.received.lock().push(ReceivedReport {
        status: form.status,
        content_type: header_value(header::CONTENT_TYPE),
        user_agent: header_value(header::USER_AGENT),
    });

    match state.behavior {
        Behavior::Respond(code) => {
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Behavior::Delay(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_reports_and_scripted_code() {
        let mock = MockCollector::start(Behavior::Respond(503)).await.unwrap();

        let response = reqwest::Client::new()
            .post(mock.status_url())
            .form(&[("status", "running")])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(mock.statuses(), vec!["running".to_string()]);
        assert_eq!(
            mock.received()[0].content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
    }
}
