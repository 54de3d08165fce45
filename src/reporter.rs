//! Reporting client for pushing state snapshots to a remote endpoint.
//!
//! The reporter flattens the current [`Snapshot`](crate::core::Snapshot) into
//! the wire [`Report`] and POSTs it on a fixed cadence. Consecutive identical
//! states (timestamp aside) are skipped to keep an idle sensor quiet.

use crate::core::Report;
use serde::Deserialize;

/// Reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Endpoint receiving state reports
    pub url: String,
}

impl ReporterConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Reporter client error types.
#[derive(Debug)]
pub enum ReporterError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for ReporterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReporterError::Config(msg) => write!(f, "Reporter config error: {msg}"),
            ReporterError::Network(msg) => write!(f, "Reporter network error: {msg}"),
            ReporterError::Server { status, message } => {
                write!(f, "Reporter server error ({status}): {message}")
            }
            ReporterError::Serialization(msg) => write!(f, "Reporter serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ReporterError {}

/// Outcome of one reporting attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The report was accepted by the endpoint
    Sent,
    /// The state matched the last sent report, nothing transmitted
    Unchanged,
}

/// Acknowledgement body from the reporting endpoint, if it sends one.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportAck {
    #[serde(default)]
    pub status: Option<String>,
}

/// Async reporting client.
pub struct ReporterClient {
    config: ReporterConfig,
    client: reqwest::Client,
    device_id: String,
    last_sent: Option<Report>,
}

impl ReporterClient {
    /// Create a new reporting client.
    pub fn new(config: ReporterConfig) -> Result<Self, ReporterError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ReporterError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Generate device ID from hostname + instance
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let device_id = format!(
            "sensor-{}-{}",
            hostname,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Ok(Self {
            config,
            client,
            device_id,
            last_sent: None,
        })
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Test connection to the reporting endpoint.
    pub async fn test_connection(&self) -> Result<bool, ReporterError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| ReporterError::Network(e.to_string()))?;

        // Many collectors only accept POST; any HTTP answer means reachable.
        let status = response.status().as_u16();
        Ok(status < 500)
    }

    /// POST one report, skipping it if the state has not changed.
    pub async fn send(&mut self, report: Report) -> Result<ReportOutcome, ReporterError> {
        if self
            .last_sent
            .as_ref()
            .is_some_and(|last| same_state(last, &report))
        {
            return Ok(ReportOutcome::Unchanged);
        }

        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(&report)
            .send()
            .await
            .map_err(|e| ReporterError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ReporterError::Server {
                status: status.as_u16(),
                message,
            });
        }

        self.last_sent = Some(report);
        Ok(ReportOutcome::Sent)
    }

    /// POST one report unconditionally.
    pub async fn force_send(&mut self, report: Report) -> Result<ReportOutcome, ReporterError> {
        self.last_sent = None;
        self.send(report).await
    }
}

/// Whether two reports describe the same state, ignoring the timestamp.
fn same_state(a: &Report, b: &Report) -> bool {
    a.emotion == b.emotion
        && a.focus == b.focus
        && a.thumbs_up == b.thumbs_up
        && a.wave == b.wave
        && a.source == b.source
}

/// Blocking reporting client for use in synchronous contexts.
pub struct BlockingReporterClient {
    inner: ReporterClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingReporterClient {
    /// Create a new blocking reporting client.
    pub fn new(config: ReporterConfig) -> Result<Self, ReporterError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ReporterError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: ReporterClient::new(config)?,
            runtime,
        })
    }

    /// Test connection to the reporting endpoint.
    pub fn test_connection(&self) -> Result<bool, ReporterError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// POST one report, skipping it if the state has not changed.
    pub fn send(&mut self, report: Report) -> Result<ReportOutcome, ReporterError> {
        let BlockingReporterClient { inner, runtime } = self;
        runtime.block_on(inner.send(report))
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}
