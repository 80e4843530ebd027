//! End-to-end handler tests: payload in, buffered records and decision out.

use cursorfuse_core::LangfuseConfig;
use hooks::{HookResponse, dispatch, get_or_create_trace};
use langfuse::{EventPayload, IngestionEvent, LangfuseClient, Level, ObservationBody};
use serde_json::json;

fn test_client() -> LangfuseClient {
  LangfuseClient::new(LangfuseConfig {
    public_key: "pk-test".into(),
    secret_key: "sk-test".into(),
    base_url: "http://127.0.0.1:9".into(),
  })
  .unwrap()
}

fn payloads(client: &LangfuseClient) -> Vec<EventPayload> {
  client.pending_batch().into_iter().map(|e: IngestionEvent| e.payload).collect()
}

fn span_creates(events: &[EventPayload]) -> Vec<&ObservationBody> {
  events
    .iter()
    .filter_map(|p| match p {
      EventPayload::SpanCreate(body) => Some(body),
      _ => None,
    })
    .collect()
}

#[test]
fn test_unknown_event_returns_none_and_emits_nothing() {
  let client = test_client();
  let input = json!({"conversation_id": "conv-1"});
  let trace = get_or_create_trace(&client, "someFutureHook", &input);
  let before = client.pending();

  let response = dispatch(&trace, "someFutureHook", &input);

  assert_eq!(response, None);
  assert_eq!(client.pending(), before);
}

#[test]
fn test_trace_bootstrap_upserts_by_conversation_id() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-42",
    "prompt": "Fix the login bug",
    "model": "gpt-4o",
    "workspace_roots": ["/home/u/shop"],
    "user_email": "dev@example.com",
    "cursor_version": "1.4.0",
  });

  let trace = get_or_create_trace(&client, "beforeSubmitPrompt", &input);
  assert_eq!(trace.id(), "conv-42");

  let events = payloads(&client);
  let EventPayload::TraceCreate(body) = &events[0] else {
    panic!("expected trace-create first");
  };
  assert_eq!(body.id, "conv-42");
  assert_eq!(body.name.as_deref(), Some("Fix the login bug"));
  assert_eq!(body.session_id.as_deref(), Some("cursor-shop"));
  assert_eq!(body.user_id.as_deref(), Some("dev@example.com"));
  assert_eq!(body.version.as_deref(), Some("1.4.0"));
  assert!(body.release.is_some());

  let tags = body.tags.as_ref().unwrap();
  assert!(tags.contains(&"cursor".to_string()));
  assert!(tags.contains(&"agent".to_string()));
  assert!(tags.contains(&"gpt-4o".to_string()));

  let metadata = body.metadata.as_ref().unwrap();
  assert_eq!(metadata["model"], "gpt-4o");
  assert_eq!(metadata["cursor_version"], "1.4.0");
}

#[test]
fn test_before_submit_prompt_records_generation_and_attachments() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "prompt": "Review these files",
    "model": "gpt-4o",
    "generation_id": "gen-9",
    "attachments": [
      {"type": "file", "filePath": "src/db.ts"},
      {"type": "image", "filePath": "docs/diagram.PNG"},
    ],
  });
  let trace = get_or_create_trace(&client, "beforeSubmitPrompt", &input);
  let before = client.pending();

  let response = dispatch(&trace, "beforeSubmitPrompt", &input);
  assert_eq!(response, Some(HookResponse::cont()));

  let events = payloads(&client)[before..].to_vec();

  // Trace name/input update, generation create, two child spans each
  // created and closed, generation update
  let generation = events
    .iter()
    .find_map(|p| match p {
      EventPayload::GenerationCreate(body) => Some(body),
      _ => None,
    })
    .expect("generation-create missing");
  assert_eq!(generation.name, "User Prompt");
  assert_eq!(generation.model.as_deref(), Some("gpt-4o"));

  let metadata = generation.metadata.as_ref().unwrap();
  assert_eq!(metadata["generation_id"], "gen-9");
  assert_eq!(metadata["attachment_count"], 2);
  assert_eq!(metadata["attachments"][1]["extension"], "png");

  let children = span_creates(&events);
  assert_eq!(children.len(), 2);
  for child in &children {
    assert_eq!(child.parent_observation_id.as_deref(), Some(generation.id.as_str()));
    assert!(child.name.starts_with("Attachment: "));
  }

  // Both children and the generation were explicitly closed
  let span_updates = events.iter().filter(|p| matches!(p, EventPayload::SpanUpdate(_))).count();
  let generation_updates = events
    .iter()
    .filter(|p| matches!(p, EventPayload::GenerationUpdate(_)))
    .count();
  assert_eq!(span_updates, 2);
  assert_eq!(generation_updates, 1);
}

#[test]
fn test_before_shell_execution_allows_and_tags() {
  let client = test_client();
  let command = "cargo test --workspace -- --nocapture and some very long tail that gets cut";
  let input = json!({
    "conversation_id": "conv-1",
    "command": command,
    "cwd": "/home/u/shop",
    "generation_id": "gen-3",
  });
  let trace = get_or_create_trace(&client, "beforeShellExecution", &input);
  let before = client.pending();

  let response = dispatch(&trace, "beforeShellExecution", &input);
  assert_eq!(response, Some(HookResponse::allow()));

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];

  // Name is a 50-char preview; the full command stays in input
  assert!(span.name.starts_with("Shell: cargo test"));
  assert_eq!(span.name.chars().count(), "Shell: ".len() + 50);
  assert_eq!(span.input.as_ref().unwrap()["command"], command);
  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["command_length"], command.len());
  assert_eq!(metadata["generation_id"], "gen-3");

  let tag_update = events
    .iter()
    .find_map(|p| match p {
      EventPayload::TraceCreate(body) if body.tags.is_some() => body.tags.clone(),
      _ => None,
    })
    .expect("tag union missing");
  assert!(tag_update.contains(&"shell".to_string()));
}

#[test]
fn test_after_shell_execution_failure_heuristic() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "command": "make build",
    "output": "Error: command not found",
    "duration": 1500,
  });
  let trace = get_or_create_trace(&client, "afterShellExecution", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterShellExecution", &input), None);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.level, Level::Warning);
  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["might_have_failed"], true);
  assert_eq!(metadata["duration_formatted"], "1.5s");
  assert_eq!(metadata["output_length"], 24);
}

#[test]
fn test_after_shell_execution_clean_output_is_default_level() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "command": "ls",
    "output": "done",
  });
  let trace = get_or_create_trace(&client, "afterShellExecution", &input);
  let before = client.pending();

  dispatch(&trace, "afterShellExecution", &input);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.level, Level::Default);
  assert_eq!(span.metadata.as_ref().unwrap()["might_have_failed"], false);
  // Absent duration formats as the zero sentinel
  assert_eq!(span.metadata.as_ref().unwrap()["duration_formatted"], "0ms");
}

#[test]
fn test_mcp_execution_records_result_size() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "tool_name": "WebSearch",
    "tool_input": {"query": "rust"},
    "result_json": {"hits": [1, 2, 3]},
    "duration": 250,
  });
  let trace = get_or_create_trace(&client, "afterMCPExecution", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterMCPExecution", &input), None);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "MCP Result: WebSearch");

  let expected_size = serde_json::to_string(&json!({"hits": [1, 2, 3]})).unwrap().len();
  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["result_size"], expected_size);
  assert_eq!(metadata["duration_formatted"], "250ms");
  assert_eq!(span.output.as_ref().unwrap()["hits"], json!([1, 2, 3]));
}

#[test]
fn test_before_mcp_execution_allows() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "tool_name": "WebSearch",
    "url": "https://mcp.example.com",
  });
  let trace = get_or_create_trace(&client, "beforeMCPExecution", &input);
  let before = client.pending();

  let response = dispatch(&trace, "beforeMCPExecution", &input);
  assert_eq!(response, Some(HookResponse::allow()));

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "MCP: WebSearch");
  assert_eq!(span.input.as_ref().unwrap()["server_url"], "https://mcp.example.com");
}

#[test]
fn test_after_file_edit_stats_in_output_and_metadata() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "file_path": "src/app/page.tsx",
    "edits": [
      {"old_string": "a", "new_string": "a\nb\nc"},
      {"old_string": "x\ny", "new_string": "x"},
    ],
  });
  let trace = get_or_create_trace(&client, "afterFileEdit", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterFileEdit", &input), None);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "Edit: page.tsx");

  let output = span.output.as_ref().unwrap();
  assert_eq!(output["edit_count"], 2);
  assert_eq!(output["lines_added"], 2);
  assert_eq!(output["lines_removed"], 1);
  assert_eq!(output["net_change"], 1);
  // Full edit content is preserved in output for agent edits
  assert_eq!(output["edits"][0]["new_string"], "a\nb\nc");

  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["file_extension"], "tsx");
  assert_eq!(metadata["editCount"], 2);
}

#[test]
fn test_tab_file_edit_reduces_output_and_marks_source() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "file_path": "src/lib/db.ts",
    "edits": [
      {"range": {"start": 3, "end": 3}, "old_line": "let x", "new_line": "const x", "old_string": "secret", "new_string": "secret2"},
    ],
  });
  let trace = get_or_create_trace(&client, "afterTabFileEdit", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterTabFileEdit", &input), None);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "Tab Edit: db.ts");

  let output = span.output.as_ref().unwrap();
  assert_eq!(output["edits"][0]["old_line"], "let x");
  assert_eq!(output["edits"][0]["new_line"], "const x");
  // Full strings never reach the reduced tab view
  assert!(output["edits"][0].get("old_string").is_none());
  assert!(output["edits"][0].get("new_string").is_none());

  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["source"], "tab");
}

#[test]
fn test_before_tab_file_read_allows_with_tab_source() {
  let client = test_client();
  let input = json!({"conversation_id": "conv-1", "file_path": "README.md"});
  let trace = get_or_create_trace(&client, "beforeTabFileRead", &input);
  let before = client.pending();

  let response = dispatch(&trace, "beforeTabFileRead", &input);
  assert_eq!(response, Some(HookResponse::allow()));

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "Tab Read: README.md");
  assert_eq!(span.metadata.as_ref().unwrap()["source"], "tab");
  assert_eq!(span.metadata.as_ref().unwrap()["file_extension"], "md");
}

#[test]
fn test_stop_emits_event_scores_and_status_tag() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "status": "aborted",
    "loop_count": 4,
    "generation_id": "gen-1",
  });
  let trace = get_or_create_trace(&client, "stop", &input);
  let before = client.pending();

  let response = dispatch(&trace, "stop", &input);
  assert_eq!(response, Some(HookResponse::empty()));

  let events = payloads(&client)[before..].to_vec();

  let stop_event = events
    .iter()
    .find_map(|p| match p {
      EventPayload::EventCreate(body) => Some(body),
      _ => None,
    })
    .expect("event-create missing");
  assert_eq!(stop_event.name, "Agent Stopped");
  assert_eq!(stop_event.level, Level::Warning);
  let metadata = stop_event.metadata.as_ref().unwrap();
  assert_eq!(metadata["status"], "aborted");
  assert_eq!(metadata["loop_count"], 4);
  assert_eq!(metadata["generation_id"], "gen-1");

  let scores: Vec<_> = events
    .iter()
    .filter_map(|p| match p {
      EventPayload::ScoreCreate(body) => Some(body),
      _ => None,
    })
    .collect();
  assert_eq!(scores.len(), 2);
  assert_eq!(scores[0].name, "completion_status");
  assert_eq!(scores[0].value, 0.5);
  assert_eq!(scores[1].name, "efficiency");
  assert!((scores[1].value - 0.6).abs() < 1e-9);
  assert_eq!(scores[1].comment.as_deref(), Some("Completed in 4 loops"));

  let tag_update = events
    .iter()
    .find_map(|p| match p {
      EventPayload::TraceCreate(body) if body.tags.is_some() => body.tags.clone(),
      _ => None,
    })
    .expect("status tag missing");
  assert!(tag_update.contains(&"status-aborted".to_string()));
}

#[test]
fn test_agent_thought_records_duration_and_tags() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "text": "thinking about\nthe problem",
    "duration_ms": 65_000,
    "generation_id": "gen-2",
  });
  let trace = get_or_create_trace(&client, "afterAgentThought", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterAgentThought", &input), None);

  let events = payloads(&client)[before..].to_vec();
  let span = span_creates(&events)[0];
  assert_eq!(span.name, "Agent Thinking");
  assert_eq!(span.input.as_ref().unwrap()["type"], "thinking");

  let metadata = span.metadata.as_ref().unwrap();
  assert_eq!(metadata["duration_ms"], 65_000);
  assert_eq!(metadata["duration_formatted"], "1m 5s");
  assert_eq!(metadata["thinking_length"], 26);
  assert_eq!(metadata["generation_id"], "gen-2");

  let tag_update = events
    .iter()
    .find_map(|p| match p {
      EventPayload::TraceCreate(body) if body.tags.is_some() => body.tags.clone(),
      _ => None,
    })
    .expect("thinking tag missing");
  assert!(tag_update.contains(&"thinking".to_string()));
}

#[test]
fn test_agent_response_updates_trace_output() {
  let client = test_client();
  let input = json!({
    "conversation_id": "conv-1",
    "text": "Here is the fix.\nApplied in db.ts.",
    "model": "gpt-4o",
  });
  let trace = get_or_create_trace(&client, "afterAgentResponse", &input);
  let before = client.pending();

  assert_eq!(dispatch(&trace, "afterAgentResponse", &input), None);

  let events = payloads(&client)[before..].to_vec();

  let trace_update = events
    .iter()
    .find_map(|p| match p {
      EventPayload::TraceCreate(body) if body.output.is_some() => Some(body),
      _ => None,
    })
    .expect("trace output update missing");
  assert_eq!(trace_update.output.as_ref().unwrap(), &json!("Here is the fix.\nApplied in db.ts."));

  let generation = events
    .iter()
    .find_map(|p| match p {
      EventPayload::GenerationCreate(body) => Some(body),
      _ => None,
    })
    .expect("generation-create missing");
  let metadata = generation.metadata.as_ref().unwrap();
  assert_eq!(metadata["line_count"], 2);
  assert_eq!(metadata["response_length"], 34);
}

#[test]
fn test_empty_payload_is_survivable_for_every_event() {
  let client = test_client();
  let empty = json!({});

  for name in [
    "beforeSubmitPrompt",
    "afterAgentResponse",
    "afterAgentThought",
    "beforeShellExecution",
    "afterShellExecution",
    "beforeMCPExecution",
    "afterMCPExecution",
    "beforeReadFile",
    "afterFileEdit",
    "stop",
    "beforeTabFileRead",
    "afterTabFileEdit",
  ] {
    let trace = get_or_create_trace(&client, name, &empty);
    // Must not panic; decisions still come back for gated kinds
    let _ = dispatch(&trace, name, &empty);
  }

  assert!(client.pending() > 0);
}
