//! Event routing and trace bootstrap.

use cursorfuse_core::HookEvent;
use cursorfuse_core::normalize::{session_id, trace_name};
use cursorfuse_core::tags::generate_tags;
use langfuse::{LangfuseClient, RELEASE, Trace, TraceUpdate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::handlers;
use crate::response::HookResponse;

/// Open (upserting) the trace for this event's conversation.
///
/// Traces are keyed by the externally supplied `conversation_id`; every
/// event of a conversation lands on the same trace. A payload without one
/// gets a fresh random id so its records still go somewhere sensible.
pub fn get_or_create_trace<'a>(client: &'a LangfuseClient, event_name: &str, input: &Value) -> Trace<'a> {
  let conversation_id = input
    .get("conversation_id")
    .and_then(Value::as_str)
    .map(String::from)
    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

  let prompt = input.get("prompt").and_then(Value::as_str);
  let model = input.get("model").and_then(Value::as_str);

  let mut metadata = Map::new();
  for key in ["cursor_version", "model", "workspace_roots", "generation_id"] {
    if let Some(value) = input.get(key) {
      metadata.insert(key.to_string(), value.clone());
    }
  }

  let trace = client.trace(conversation_id);
  trace.update(TraceUpdate {
    name: Some(trace_name(prompt, model)),
    session_id: Some(session_id(input.get("workspace_roots"))),
    user_id: input.get("user_email").and_then(Value::as_str).map(String::from),
    release: Some(RELEASE.to_string()),
    version: input.get("cursor_version").and_then(Value::as_str).map(String::from),
    metadata: Some(Value::Object(metadata)),
    tags: Some(generate_tags(event_name, input).into_iter().collect()),
    ..Default::default()
  });

  trace
}

/// Route a named event to its handler.
///
/// Total over its input domain: an unknown name is a handled case that
/// logs a diagnostic and yields `None`, never an error.
pub fn dispatch(trace: &Trace, name: &str, input: &Value) -> Option<HookResponse> {
  let Ok(event) = name.parse::<HookEvent>() else {
    warn!("Unknown hook type: {}", name);
    return None;
  };

  debug!("Processing hook event: {}", event);

  match event {
    HookEvent::BeforeSubmitPrompt => handlers::on_before_submit_prompt(trace, input),
    HookEvent::AfterAgentResponse => handlers::on_after_agent_response(trace, input),
    HookEvent::AfterAgentThought => handlers::on_after_agent_thought(trace, input),
    HookEvent::BeforeShellExecution => handlers::on_before_shell_execution(trace, input),
    HookEvent::AfterShellExecution => handlers::on_after_shell_execution(trace, input),
    HookEvent::BeforeMcpExecution => handlers::on_before_mcp_execution(trace, input),
    HookEvent::AfterMcpExecution => handlers::on_after_mcp_execution(trace, input),
    HookEvent::BeforeReadFile => handlers::on_before_read_file(trace, input),
    HookEvent::AfterFileEdit => handlers::on_after_file_edit(trace, input),
    HookEvent::Stop => handlers::on_stop(trace, input),
    HookEvent::BeforeTabFileRead => handlers::on_before_tab_file_read(trace, input),
    HookEvent::AfterTabFileEdit => handlers::on_after_tab_file_edit(trace, input),
  }
}
