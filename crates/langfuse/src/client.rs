//! Buffered Langfuse ingestion client.
//!
//! Emission is fire-and-forget into an in-memory buffer; nothing leaves the
//! process until `flush`. Delivery failures are returned to the caller, never
//! swallowed: hook output is best-effort diagnostic data, but losing it must
//! be visible to whoever decides process exit.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use cursorfuse_core::LangfuseConfig;
use tracing::{debug, warn};

use crate::model::{IngestionBatch, IngestionEvent, IngestionResponse};
use crate::trace::Trace;

/// Release stamp applied to every trace.
pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum LangfuseError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Backend error: {0}")]
  Backend(String),
}

#[derive(Debug)]
pub struct LangfuseClient {
  http: reqwest::Client,
  config: LangfuseConfig,
  buffer: Mutex<Vec<IngestionEvent>>,
}

/// Health probe result for the ingestion backend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
  pub available: bool,
  pub version: Option<String>,
}

impl LangfuseClient {
  pub fn new(config: LangfuseConfig) -> Result<Self, LangfuseError> {
    let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self {
      http,
      config,
      buffer: Mutex::new(Vec::new()),
    })
  }

  fn ingestion_url(&self) -> String {
    format!("{}/api/public/ingestion", self.config.base_url)
  }

  fn health_url(&self) -> String {
    format!("{}/api/public/health", self.config.base_url)
  }

  /// Open a handle onto the trace with the given id (upsert semantics:
  /// the id is externally supplied and stable per conversation).
  pub fn trace(&self, id: impl Into<String>) -> Trace<'_> {
    Trace::new(self, id.into())
  }

  /// Append an event to the in-memory buffer. Infallible by design.
  pub(crate) fn enqueue(&self, event: IngestionEvent) {
    let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
    buffer.push(event);
  }

  /// Number of buffered, not-yet-delivered events.
  pub fn pending(&self) -> usize {
    self.buffer.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Snapshot of the buffered batch, for diagnostics.
  pub fn pending_batch(&self) -> Vec<IngestionEvent> {
    self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Deliver all buffered events to the ingestion endpoint.
  ///
  /// The buffer is drained up front; there is no retry here. The backend
  /// answers per-event (207 style), so a 2xx status can still carry
  /// rejections - those are reported as errors too.
  pub async fn flush(&self) -> Result<(), LangfuseError> {
    let batch: Vec<IngestionEvent> = {
      let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
      buffer.drain(..).collect()
    };

    if batch.is_empty() {
      return Ok(());
    }

    let count = batch.len();
    debug!("Flushing {} events to {}", count, self.ingestion_url());

    let response = self
      .http
      .post(self.ingestion_url())
      .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
      .json(&IngestionBatch { batch })
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      warn!("Langfuse ingestion failed: {} - {}", status, body);
      return Err(LangfuseError::Backend(format!("ingestion returned {}: {}", status, body)));
    }

    let result: IngestionResponse = response.json().await.unwrap_or_default();
    if !result.errors.is_empty() {
      warn!("Langfuse rejected {} of {} events", result.errors.len(), count);
      return Err(LangfuseError::Backend(format!(
        "{} of {} events rejected",
        result.errors.len(),
        count
      )));
    }

    debug!("Flushed {} events", count);
    Ok(())
  }

  /// Final flush before process exit.
  pub async fn shutdown(&self) -> Result<(), LangfuseError> {
    self.flush().await
  }

  /// Probe the backend health endpoint.
  pub async fn health(&self) -> HealthStatus {
    match self.http.get(self.health_url()).send().await {
      Ok(response) if response.status().is_success() => {
        let version = response
          .json::<serde_json::Value>()
          .await
          .ok()
          .and_then(|v| v.get("version").and_then(|v| v.as_str()).map(String::from));
        HealthStatus {
          available: true,
          version,
        }
      }
      _ => HealthStatus {
        available: false,
        version: None,
      },
    }
  }
}
