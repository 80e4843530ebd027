//! Trace handle and observation guards.
//!
//! A `Trace` borrows the client and names one conversation-keyed trace.
//! `Span` and `Generation` are must-use guards: creation emits the
//! `*-create` record immediately, and the consuming `end()` emits the
//! matching `*-update` with the end time. An observation that is never
//! ended is a defect, and the compiler nags about it.

use chrono::Utc;
use serde_json::Value;

use crate::client::LangfuseClient;
use crate::model::{EventPayload, IngestionEvent, Level, ObservationBody, ObservationUpdate, ScoreBody, TraceBody};

/// Parameters for creating a span, generation, or trace-level event.
#[derive(Debug, Clone, Default)]
pub struct ObservationParams {
  pub name: String,
  pub input: Option<Value>,
  pub output: Option<Value>,
  pub level: Level,
  pub metadata: Option<Value>,
  pub model: Option<String>,
}

/// Partial trace update; only the populated fields are upserted.
#[derive(Debug, Clone, Default)]
pub struct TraceUpdate {
  pub name: Option<String>,
  pub session_id: Option<String>,
  pub user_id: Option<String>,
  pub release: Option<String>,
  pub version: Option<String>,
  pub input: Option<Value>,
  pub output: Option<Value>,
  pub metadata: Option<Value>,
  pub tags: Option<Vec<String>>,
}

/// Handle onto one trace in the ingestion buffer.
#[derive(Debug)]
pub struct Trace<'a> {
  client: &'a LangfuseClient,
  id: String,
}

impl<'a> Trace<'a> {
  pub(crate) fn new(client: &'a LangfuseClient, id: String) -> Self {
    Self { client, id }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// Upsert trace-level fields.
  pub fn update(&self, update: TraceUpdate) {
    self.client.enqueue(IngestionEvent::new(EventPayload::TraceCreate(TraceBody {
      id: self.id.clone(),
      name: update.name,
      session_id: update.session_id,
      user_id: update.user_id,
      release: update.release,
      version: update.version,
      input: update.input,
      output: update.output,
      metadata: update.metadata,
      tags: update.tags,
    })));
  }

  /// Union tags onto the trace. Empty input is a no-op.
  pub fn add_tags(&self, tags: impl IntoIterator<Item = String>) {
    let tags: Vec<String> = tags.into_iter().collect();
    if tags.is_empty() {
      return;
    }
    self.update(TraceUpdate {
      tags: Some(tags),
      ..Default::default()
    });
  }

  /// Attach a numeric score to the trace.
  pub fn score(&self, name: &str, value: f64, comment: Option<&str>) {
    self.client.enqueue(IngestionEvent::new(EventPayload::ScoreCreate(ScoreBody {
      id: uuid::Uuid::new_v4().to_string(),
      trace_id: self.id.clone(),
      name: name.to_string(),
      value,
      comment: comment.map(String::from),
      data_type: "NUMERIC".to_string(),
    })));
  }

  /// Emit a trace-level event (no explicit close required).
  pub fn event(&self, params: ObservationParams) {
    let body = self.observation_body(params);
    self.client.enqueue(IngestionEvent::new(EventPayload::EventCreate(body)));
  }

  /// Open a span. The returned guard must be closed with `end()`.
  pub fn span(&self, params: ObservationParams) -> Span<'a> {
    let body = self.observation_body(params);
    let id = body.id.clone();
    self.client.enqueue(IngestionEvent::new(EventPayload::SpanCreate(body)));
    Span {
      client: self.client,
      trace_id: self.id.clone(),
      id,
    }
  }

  /// Open a generation. The returned guard must be closed with `end()`.
  pub fn generation(&self, params: ObservationParams) -> Generation<'a> {
    let body = self.observation_body(params);
    let id = body.id.clone();
    self.client.enqueue(IngestionEvent::new(EventPayload::GenerationCreate(body)));
    Generation {
      client: self.client,
      trace_id: self.id.clone(),
      id,
    }
  }

  fn observation_body(&self, params: ObservationParams) -> ObservationBody {
    ObservationBody {
      id: uuid::Uuid::new_v4().to_string(),
      trace_id: self.id.clone(),
      parent_observation_id: None,
      name: params.name,
      start_time: Utc::now(),
      end_time: None,
      input: params.input,
      output: params.output,
      level: params.level,
      metadata: params.metadata,
      model: params.model,
    }
  }
}

/// Open span; consumed by `end()`.
#[must_use = "spans must be closed with end()"]
#[derive(Debug)]
pub struct Span<'a> {
  client: &'a LangfuseClient,
  trace_id: String,
  id: String,
}

impl Span<'_> {
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Close the span, stamping its end time.
  pub fn end(self) {
    self.client.enqueue(IngestionEvent::new(EventPayload::SpanUpdate(ObservationUpdate {
      id: self.id,
      trace_id: self.trace_id,
      end_time: Utc::now(),
    })));
  }
}

/// Open generation; consumed by `end()`.
#[must_use = "generations must be closed with end()"]
#[derive(Debug)]
pub struct Generation<'a> {
  client: &'a LangfuseClient,
  trace_id: String,
  id: String,
}

impl<'a> Generation<'a> {
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Open a child span nested under this generation.
  pub fn child_span(&self, params: ObservationParams) -> Span<'a> {
    let body = ObservationBody {
      id: uuid::Uuid::new_v4().to_string(),
      trace_id: self.trace_id.clone(),
      parent_observation_id: Some(self.id.clone()),
      name: params.name,
      start_time: Utc::now(),
      end_time: None,
      input: params.input,
      output: params.output,
      level: params.level,
      metadata: params.metadata,
      model: params.model,
    };
    let id = body.id.clone();
    self.client.enqueue(IngestionEvent::new(EventPayload::SpanCreate(body)));
    Span {
      client: self.client,
      trace_id: self.trace_id.clone(),
      id,
    }
  }

  /// Close the generation, stamping its end time.
  pub fn end(self) {
    self
      .client
      .enqueue(IngestionEvent::new(EventPayload::GenerationUpdate(ObservationUpdate {
        id: self.id,
        trace_id: self.trace_id,
        end_time: Utc::now(),
      })));
  }
}
