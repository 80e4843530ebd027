//! Hook event handlers.
//!
//! One handler per event kind. Handlers are thin emitters: they pull a
//! bounded, display-safe view out of the payload, shape it into trace
//! records, and return the decision Cursor expects. All payload access
//! defaults defensively; a handler never fails the hook.

use cursorfuse_core::normalize::{
  edit_stats, file_extension, file_name, format_duration, might_have_failed, truncate_chars,
};
use cursorfuse_core::tags::generate_tags;
use langfuse::{Level, ObservationParams, Trace, TraceUpdate};
use serde_json::{Map, Value, json};

use crate::response::HookResponse;
use crate::scores::completion_scores;

const PROMPT_NAME_MAX: usize = 100;
const SHELL_NAME_MAX: usize = 50;
const SHELL_RESULT_NAME_MAX: usize = 40;

/// Metadata seeded with the correlation token, when present.
///
/// `generation_id` must flow unchanged into every record for correlation.
fn base_metadata(input: &Value) -> Map<String, Value> {
  let mut metadata = Map::new();
  if let Some(generation_id) = input.get("generation_id") {
    metadata.insert("generation_id".to_string(), generation_id.clone());
  }
  metadata
}

fn str_field<'v>(input: &'v Value, key: &str) -> Option<&'v str> {
  input.get(key).and_then(Value::as_str)
}

/// Merge the camelCase edit-stat fields into an observation's metadata.
fn extend_with_stats(metadata: &mut Map<String, Value>, stats: cursorfuse_core::EditStats) {
  if let Ok(Value::Object(fields)) = serde_json::to_value(stats) {
    metadata.extend(fields);
  }
}

pub fn on_before_submit_prompt(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let prompt = str_field(input, "prompt").unwrap_or("");
  let attachments = input.get("attachments").and_then(Value::as_array);

  let name = if prompt.is_empty() {
    "User Prompt".to_string()
  } else {
    truncate_chars(prompt, PROMPT_NAME_MAX).to_string()
  };

  trace.update(TraceUpdate {
    name: Some(name),
    input: input.get("prompt").cloned(),
    ..Default::default()
  });

  let attachment_summaries: Vec<Value> = attachments
    .map(|list| {
      list
        .iter()
        .map(|a| {
          json!({
            "type": a.get("type"),
            "path": a.get("filePath"),
            "extension": file_extension(a.get("filePath").and_then(Value::as_str)),
          })
        })
        .collect()
    })
    .unwrap_or_default();

  let mut metadata = base_metadata(input);
  metadata.insert("attachment_count".to_string(), json!(attachment_summaries.len()));
  metadata.insert("attachments".to_string(), Value::Array(attachment_summaries));

  let generation = trace.generation(ObservationParams {
    name: "User Prompt".to_string(),
    input: input.get("prompt").cloned(),
    model: str_field(input, "model").map(String::from),
    metadata: Some(Value::Object(metadata)),
    ..Default::default()
  });

  if let Some(list) = attachments {
    for attachment in list {
      let kind = attachment.get("type").and_then(Value::as_str).unwrap_or("unknown");
      generation
        .child_span(ObservationParams {
          name: format!("Attachment: {}", kind),
          input: Some(json!({
            "type": attachment.get("type"),
            "filePath": attachment.get("filePath"),
            "extension": file_extension(attachment.get("filePath").and_then(Value::as_str)),
          })),
          ..Default::default()
        })
        .end();
    }
  }
  generation.end();

  Some(HookResponse::cont())
}

pub fn on_after_agent_response(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let text = str_field(input, "text").unwrap_or("");
  let line_count = if text.is_empty() { 0 } else { text.split('\n').count() };

  trace.update(TraceUpdate {
    output: input.get("text").cloned(),
    ..Default::default()
  });

  let mut metadata = base_metadata(input);
  metadata.insert("response_length".to_string(), json!(text.len()));
  metadata.insert("line_count".to_string(), json!(line_count));

  let generation = trace.generation(ObservationParams {
    name: "Agent Response".to_string(),
    output: input.get("text").cloned(),
    model: str_field(input, "model").map(String::from),
    metadata: Some(Value::Object(metadata)),
    ..Default::default()
  });
  generation.end();

  None
}

pub fn on_after_agent_thought(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let duration_ms = input.get("duration_ms").and_then(Value::as_i64);
  let thinking_length = str_field(input, "text").map(str::len).unwrap_or(0);

  let mut metadata = base_metadata(input);
  if let Some(duration) = input.get("duration_ms") {
    metadata.insert("duration_ms".to_string(), duration.clone());
  }
  metadata.insert("duration_formatted".to_string(), json!(format_duration(duration_ms)));
  metadata.insert("thinking_length".to_string(), json!(thinking_length));

  trace
    .span(ObservationParams {
      name: "Agent Thinking".to_string(),
      input: Some(json!({"type": "thinking"})),
      output: input.get("text").cloned(),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  trace.add_tags(generate_tags("afterAgentThought", input));
  None
}

pub fn on_before_shell_execution(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let command = str_field(input, "command").unwrap_or("");
  let name = if command.is_empty() {
    "Shell: command".to_string()
  } else {
    format!("Shell: {}", truncate_chars(command, SHELL_NAME_MAX))
  };

  let mut metadata = base_metadata(input);
  metadata.insert("command_length".to_string(), json!(command.len()));

  trace
    .span(ObservationParams {
      name,
      input: Some(json!({"command": input.get("command"), "cwd": input.get("cwd")})),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  trace.add_tags(generate_tags("beforeShellExecution", input));
  Some(HookResponse::allow())
}

pub fn on_after_shell_execution(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let command = str_field(input, "command").unwrap_or("");
  let output = str_field(input, "output").unwrap_or("");
  let failed = might_have_failed(output);
  let duration = input.get("duration").and_then(Value::as_i64);

  let name = if command.is_empty() {
    "Shell Result: command".to_string()
  } else {
    format!("Shell Result: {}", truncate_chars(command, SHELL_RESULT_NAME_MAX))
  };

  let mut metadata = base_metadata(input);
  if let Some(ms) = input.get("duration") {
    metadata.insert("duration_ms".to_string(), ms.clone());
  }
  metadata.insert("duration_formatted".to_string(), json!(format_duration(duration)));
  metadata.insert("output_length".to_string(), json!(output.len()));
  metadata.insert("might_have_failed".to_string(), json!(failed));

  trace
    .span(ObservationParams {
      name,
      input: Some(json!({"command": input.get("command")})),
      output: input.get("output").cloned(),
      level: if failed { Level::Warning } else { Level::Default },
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  None
}

pub fn on_before_mcp_execution(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let tool = str_field(input, "tool_name").filter(|t| !t.is_empty()).unwrap_or("tool");

  trace
    .span(ObservationParams {
      name: format!("MCP: {}", tool),
      input: Some(json!({
        "tool_name": input.get("tool_name"),
        "tool_input": input.get("tool_input"),
        "server_url": input.get("url"),
        "server_command": input.get("command"),
      })),
      metadata: Some(Value::Object(base_metadata(input))),
      ..Default::default()
    })
    .end();

  trace.add_tags(generate_tags("beforeMCPExecution", input));
  Some(HookResponse::allow())
}

pub fn on_after_mcp_execution(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let tool = str_field(input, "tool_name").filter(|t| !t.is_empty()).unwrap_or("tool");
  let result = input.get("result_json").cloned().unwrap_or(Value::Null);
  let duration = input.get("duration").and_then(Value::as_i64);

  // Serialized size of the result; string-length approximation if the
  // serializer refuses it
  let result_size = serde_json::to_string(&result)
    .map(|s| s.len())
    .unwrap_or_else(|_| result.to_string().len());

  let mut metadata = base_metadata(input);
  if let Some(ms) = input.get("duration") {
    metadata.insert("duration_ms".to_string(), ms.clone());
  }
  metadata.insert("duration_formatted".to_string(), json!(format_duration(duration)));
  metadata.insert("result_size".to_string(), json!(result_size));

  trace
    .span(ObservationParams {
      name: format!("MCP Result: {}", tool),
      input: Some(json!({
        "tool_name": input.get("tool_name"),
        "tool_input": input.get("tool_input"),
      })),
      output: input.get("result_json").cloned(),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  None
}

pub fn on_before_read_file(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let path = str_field(input, "file_path");
  let extension = file_extension(path);

  let mut metadata = base_metadata(input);
  metadata.insert("file_extension".to_string(), json!(extension));

  trace
    .span(ObservationParams {
      name: format!("Read: {}", file_name(path)),
      input: Some(json!({"file_path": input.get("file_path"), "extension": extension})),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  trace.add_tags(generate_tags("beforeReadFile", input));
  Some(HookResponse::allow())
}

pub fn on_after_file_edit(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let path = str_field(input, "file_path");
  let extension = file_extension(path);
  let stats = edit_stats(input.get("edits"));

  let mut metadata = base_metadata(input);
  metadata.insert("file_extension".to_string(), json!(extension));
  extend_with_stats(&mut metadata, stats);

  trace
    .span(ObservationParams {
      name: format!("Edit: {}", file_name(path)),
      input: Some(json!({"file_path": input.get("file_path"), "extension": extension})),
      output: Some(json!({
        "edit_count": stats.edit_count,
        "lines_added": stats.lines_added,
        "lines_removed": stats.lines_removed,
        "net_change": stats.net_change,
        "edits": input.get("edits"),
      })),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  None
}

pub fn on_stop(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let status = str_field(input, "status").unwrap_or("unknown");

  let mut metadata = base_metadata(input);
  if let Some(s) = input.get("status") {
    metadata.insert("status".to_string(), s.clone());
  }
  if let Some(loops) = input.get("loop_count") {
    metadata.insert("loop_count".to_string(), loops.clone());
  }

  trace.event(ObservationParams {
    name: "Agent Stopped".to_string(),
    level: Level::for_status(status),
    metadata: Some(Value::Object(metadata)),
    ..Default::default()
  });

  for score in completion_scores(status, input.get("loop_count").and_then(Value::as_f64)) {
    trace.score(score.name, score.value, Some(&score.comment));
  }
  trace.add_tags([format!("status-{}", status)]);

  Some(HookResponse::empty())
}

pub fn on_before_tab_file_read(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let path = str_field(input, "file_path");
  let extension = file_extension(path);

  let mut metadata = base_metadata(input);
  metadata.insert("file_extension".to_string(), json!(extension));
  metadata.insert("source".to_string(), json!("tab"));

  trace
    .span(ObservationParams {
      name: format!("Tab Read: {}", file_name(path)),
      input: Some(json!({"file_path": input.get("file_path"), "extension": extension})),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  Some(HookResponse::allow())
}

pub fn on_after_tab_file_edit(trace: &Trace, input: &Value) -> Option<HookResponse> {
  let path = str_field(input, "file_path");
  let extension = file_extension(path);
  let stats = edit_stats(input.get("edits"));

  // Tab edits expose only a reduced view of each edit, never full content
  let reduced_edits: Vec<Value> = input
    .get("edits")
    .and_then(Value::as_array)
    .map(|edits| {
      edits
        .iter()
        .map(|e| {
          json!({
            "range": e.get("range"),
            "old_line": e.get("old_line"),
            "new_line": e.get("new_line"),
          })
        })
        .collect()
    })
    .unwrap_or_default();

  let mut metadata = base_metadata(input);
  metadata.insert("file_extension".to_string(), json!(extension));
  metadata.insert("source".to_string(), json!("tab"));
  extend_with_stats(&mut metadata, stats);

  trace
    .span(ObservationParams {
      name: format!("Tab Edit: {}", file_name(path)),
      input: Some(json!({"file_path": input.get("file_path"), "extension": extension})),
      output: Some(json!({
        "edit_count": stats.edit_count,
        "edits": reduced_edits,
      })),
      metadata: Some(Value::Object(metadata)),
      ..Default::default()
    })
    .end();

  None
}
