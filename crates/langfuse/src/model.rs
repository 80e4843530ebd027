//! Wire types for the Langfuse public ingestion API.
//!
//! Records are append-only: a batch of typed events, each wrapping a body.
//! Traces are upserted by id; observations (spans, generations, trace-level
//! events) are created once and closed by a matching `*-update` carrying the
//! end time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observation severity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
  Debug,
  #[default]
  Default,
  Warning,
  Error,
}

impl Level {
  /// Map an agent run status onto an observation level.
  pub fn for_status(status: &str) -> Self {
    match status {
      "error" => Self::Error,
      "aborted" => Self::Warning,
      _ => Self::Default,
    }
  }
}

/// One entry in an ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionEvent {
  pub id: String,
  pub timestamp: DateTime<Utc>,
  #[serde(flatten)]
  pub payload: EventPayload,
}

impl IngestionEvent {
  pub fn new(payload: EventPayload) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      timestamp: Utc::now(),
      payload,
    }
  }
}

/// Typed event body. The `type` discriminant matches the ingestion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum EventPayload {
  #[serde(rename = "trace-create")]
  TraceCreate(TraceBody),
  #[serde(rename = "span-create")]
  SpanCreate(ObservationBody),
  #[serde(rename = "span-update")]
  SpanUpdate(ObservationUpdate),
  #[serde(rename = "generation-create")]
  GenerationCreate(ObservationBody),
  #[serde(rename = "generation-update")]
  GenerationUpdate(ObservationUpdate),
  #[serde(rename = "event-create")]
  EventCreate(ObservationBody),
  #[serde(rename = "score-create")]
  ScoreCreate(ScoreBody),
}

/// Trace upsert body. Only the fields present are applied server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub session_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub input: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub metadata: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tags: Option<Vec<String>>,
}

/// Body for span/generation/event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
  pub id: String,
  pub trace_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_observation_id: Option<String>,
  pub name: String,
  pub start_time: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_time: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub input: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub output: Option<Value>,
  pub level: Level,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub metadata: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
}

/// Close an open observation by stamping its end time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationUpdate {
  pub id: String,
  pub trace_id: String,
  pub end_time: DateTime<Utc>,
}

/// Numeric score attached to a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBody {
  pub id: String,
  pub trace_id: String,
  pub name: String,
  pub value: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  pub data_type: String,
}

/// Request body for `POST /api/public/ingestion`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionBatch {
  pub batch: Vec<IngestionEvent>,
}

/// Ingestion response: the API reports per-event outcomes (207 style).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestionResponse {
  #[serde(default)]
  pub successes: Vec<Value>,
  #[serde(default)]
  pub errors: Vec<Value>,
}
