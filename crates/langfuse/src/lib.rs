pub mod client;
pub mod model;
pub mod trace;

pub use client::{HealthStatus, LangfuseClient, LangfuseError, RELEASE};
pub use model::{
  EventPayload, IngestionBatch, IngestionEvent, Level, ObservationBody, ObservationUpdate, ScoreBody, TraceBody,
};
pub use trace::{Generation, ObservationParams, Span, Trace, TraceUpdate};
