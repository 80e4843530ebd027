//! Tag derivation for traces.
//!
//! Tags are set-valued: deduplicated, order-irrelevant, and only ever
//! unioned onto a trace. The accumulator is returned by value so handlers
//! stay free of hidden state.

use std::collections::BTreeSet;

use serde_json::Value;

const MODEL_TAG_MAX: usize = 30;
const MCP_TOOL_TAG_MAX: usize = 20;

/// Normalize a model identifier into a tag-friendly form.
///
/// Lowercase, everything outside `[a-z0-9-]` becomes `-`, runs of `-`
/// collapse, truncated to 30 chars.
pub fn model_tag(model: &str) -> String {
  let mut tag = String::new();
  let mut prev_dash = false;

  for c in model.to_lowercase().chars() {
    let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
      c
    } else {
      '-'
    };

    if c == '-' {
      if prev_dash {
        continue;
      }
      prev_dash = true;
    } else {
      prev_dash = false;
    }

    tag.push(c);
    if tag.len() == MODEL_TAG_MAX {
      break;
    }
  }

  tag
}

/// Derive descriptive tags from an event name and its payload.
pub fn generate_tags(event_name: &str, payload: &Value) -> BTreeSet<String> {
  let mut tags = BTreeSet::new();

  tags.insert("cursor".to_string());

  if event_name.contains("Tab") {
    tags.insert("tab".to_string());
  } else {
    tags.insert("agent".to_string());
  }

  if let Some(model) = payload.get("model").and_then(Value::as_str)
    && !model.is_empty()
  {
    tags.insert(model_tag(model));
  }

  match event_name {
    "beforeShellExecution" | "afterShellExecution" => {
      tags.insert("shell".to_string());
    }
    "beforeMCPExecution" | "afterMCPExecution" => {
      tags.insert("mcp".to_string());
      if let Some(tool) = payload.get("tool_name").and_then(Value::as_str)
        && !tool.is_empty()
      {
        let tool = tool.to_lowercase();
        let tool = crate::normalize::truncate_chars(&tool, MCP_TOOL_TAG_MAX);
        tags.insert(format!("mcp-{}", tool));
      }
    }
    "beforeReadFile" | "afterFileEdit" | "beforeTabFileRead" | "afterTabFileEdit" => {
      tags.insert("file-ops".to_string());
    }
    "afterAgentThought" => {
      tags.insert("thinking".to_string());
    }
    _ => {}
  }

  tags
}
