//! HTTP status reporter
//!
//! One report = one form-encoded POST (`status=<running|stopped>`) on a fresh
//! connection. No retry and no backoff: the next tick is the retry.

use crate::config::ReporterConfig;
use crate::status::{ReportedStatus, StatusEvent};
use reqwest::{Client, Url};
use std::error::Error as _;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("timed out waiting for the collector")]
    Timeout,
    #[error("connection refused by the collector")]
    ConnectionRefused,
    #[error("could not resolve the collector host")]
    Dns,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("collector answered with HTTP {0}")]
    NonSuccessStatus(u16),
    #[error("could not encode status body: {0}")]
    EncodingError(String),
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(String),
    #[error("refusing plain http endpoint {0} (set allow_insecure_http to opt in)")]
    InsecureEndpoint(String),
}

impl ReportError {
    /// Transient failure of the network path
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionRefused | Self::Dns | Self::Transport(_)
        )
    }
}

/// Anything that can deliver a status observation
pub trait StatusSink: Send + Sync + 'static {
    fn report(
        &self,
        status: ReportedStatus,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}

pub struct Reporter {
    client: Client,
    endpoint: String,
    allow_insecure_http: bool,
    request_timeout: Duration,
}

impl Reporter {
    pub fn new(config: &ReporterConfig) -> Result<Self, ReportError> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                config.service_name,
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            // every report opens its own connection
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            allow_insecure_http: config.allow_insecure_http,
            request_timeout: config.connect_timeout() + config.read_timeout(),
        })
    }

    /// Send a single observation and classify the outcome
    pub async fn send(&self, event: StatusEvent) -> Result<(), ReportError> {
        let url = self.target()?;

        let response = self
            .client
            .post(url)
            .form(&event.form_fields())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify)?;

        let code = response.status();
        if code.is_success() {
            Ok(())
        } else {
            Err(ReportError::NonSuccessStatus(code.as_u16()))
        }
    }

    fn target(&self) -> Result<Url, ReportError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ReportError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        match url.scheme() {
            "https" => Ok(url),
            "http" if self.allow_insecure_http => Ok(url),
            "http" => Err(ReportError::InsecureEndpoint(self.endpoint.clone())),
            other => Err(ReportError::InvalidEndpoint(format!(
                "unsupported scheme {other:?} in {}",
                self.endpoint
            ))),
        }
    }
}

impl StatusSink for Reporter {
    fn report(
        &self,
        status: ReportedStatus,
    ) -> impl Future<Output = Result<(), ReportError>> + Send {
        self.send(StatusEvent::now(status))
    }
}

/// Map a reqwest failure onto the report taxonomy
fn classify(err: reqwest::Error) -> ReportError {
    if err.is_timeout() {
        return ReportError::Timeout;
    }
    if err.is_builder() {
        return ReportError::EncodingError(err.to_string());
    }

    let mut cause = err.source();
    while let Some(inner) = cause {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => return ReportError::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return ReportError::Timeout,
                _ => {}
            }
        }
        if inner.to_string().contains("dns error") {
            return ReportError::Dns;
        }
        cause = inner.source();
    }

    ReportError::Transport(err.to_string())
}

/// Log the outcome of one report. Nothing is propagated.
pub fn log_outcome(status: ReportedStatus, result: &Result<(), ReportError>) {
    match result {
        Ok(()) => debug!(%status, "status sent"),
        Err(e @ ReportError::NonSuccessStatus(_)) => warn!(%status, error = %e, "collector rejected status"),
        Err(e) if e.is_network() => warn!(%status, error = %e, "failed to send status"),
        Err(e) => error!(%status, error = %e, "status report misconfigured"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_devkit::{unused_local_endpoint, Behavior, MockCollector};

    fn config_for(endpoint: String) -> ReporterConfig {
        ReporterConfig {
            endpoint_url: endpoint,
            allow_insecure_http: true,
            connect_timeout_ms: 200,
            read_timeout_ms: 300,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_report_success_on_200() {
        let collector = MockCollector::start(Behavior::Respond(200)).await.unwrap();
        let reporter = Reporter::new(&config_for(collector.status_url())).unwrap();

        reporter.report(ReportedStatus::Running).await.unwrap();

        let received = collector.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].status, "running");
        assert_eq!(received[0].content_type.as_deref(), Some("application/x-www-form-urlencoded"));
        assert!(received[0].user_agent.as_deref().unwrap_or_default().starts_with("vigil-reporter/"));
    }

    #[tokio::test]
    async fn test_report_non_success_status() {
        let collector = MockCollector::start(Behavior::Respond(500)).await.unwrap();
        let reporter = Reporter::new(&config_for(collector.status_url())).unwrap();

        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert_eq!(err, ReportError::NonSuccessStatus(500));
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn test_report_timeout_when_collector_hangs() {
        let collector = MockCollector::start(Behavior::Delay(Duration::from_secs(5)))
            .await
            .unwrap();
        let reporter = Reporter::new(&config_for(collector.status_url())).unwrap();

        let started = std::time::Instant::now();
        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert_eq!(err, ReportError::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_report_connection_refused() {
        let endpoint = unused_local_endpoint().unwrap();
        let reporter = Reporter::new(&config_for(endpoint)).unwrap();

        let err = reporter.report(ReportedStatus::Stopped).await.unwrap_err();
        assert_eq!(err, ReportError::ConnectionRefused);
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_report_dns_failure() {
        // .invalid never resolves; generous timeouts so slow resolvers are not read as Timeout
        let config = ReporterConfig {
            connect_timeout_ms: 5_000,
            read_timeout_ms: 5_000,
            ..config_for("http://collector.invalid/log/status".to_string())
        };
        let reporter = Reporter::new(&config).unwrap();

        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert_eq!(err, ReportError::Dns);
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_plain_http_requires_opt_in() {
        let collector = MockCollector::start(Behavior::Respond(200)).await.unwrap();
        let config = ReporterConfig {
            allow_insecure_http: false,
            ..config_for(collector.status_url())
        };
        let reporter = Reporter::new(&config).unwrap();

        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert!(matches!(err, ReportError::InsecureEndpoint(_)));
        assert!(collector.received().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_endpoint() {
        let reporter = Reporter::new(&config_for("not a url".to_string())).unwrap();
        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidEndpoint(_)));

        let reporter = Reporter::new(&config_for("ftp://collector/log".to_string())).unwrap();
        let err = reporter.report(ReportedStatus::Running).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidEndpoint(_)));
    }
}
