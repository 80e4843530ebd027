//! Bounded, display-safe field extraction from hook payloads.
//!
//! Every function here defaults defensively: absent or oddly-typed payload
//! fields yield empty strings, zeros, or `"unknown"`, never errors. Hook
//! processing must not block the IDE workflow it observes.

use serde::Serialize;
use serde_json::Value;

/// Truncate to at most `max` characters, respecting char boundaries.
///
/// Used for human-readable span names only; full values always go into
/// `input`/`output` untruncated.
pub fn truncate_chars(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

/// File extension without the dot, lowercased, or `"unknown"`.
pub fn file_extension(path: Option<&str>) -> String {
  let Some(path) = path else {
    return "unknown".to_string();
  };
  if path.is_empty() {
    return "unknown".to_string();
  }

  let parts: Vec<&str> = path.split('.').collect();
  if parts.len() < 2 {
    return "unknown".to_string();
  }

  parts.last().unwrap_or(&"").to_lowercase()
}

/// Final path segment for display, or the literal `"file"` when absent.
pub fn file_name(path: Option<&str>) -> &str {
  path
    .and_then(|p| p.rsplit('/').next())
    .filter(|segment| !segment.is_empty())
    .unwrap_or("file")
}

/// Aggregate line-change statistics for one file-edit event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditStats {
  pub edit_count: usize,
  pub lines_added: u64,
  pub lines_removed: u64,
  pub net_change: i64,
}

/// Compute edit statistics from an `edits` payload field.
///
/// Missing or non-array input yields all-zero stats.
pub fn edit_stats(edits: Option<&Value>) -> EditStats {
  let Some(edits) = edits.and_then(Value::as_array) else {
    return EditStats::default();
  };

  let mut lines_added: u64 = 0;
  let mut lines_removed: u64 = 0;

  for edit in edits {
    let old_lines = edit.get("old_string").and_then(Value::as_str).unwrap_or("").split('\n').count();
    let new_lines = edit.get("new_string").and_then(Value::as_str).unwrap_or("").split('\n').count();

    if new_lines > old_lines {
      lines_added += (new_lines - old_lines) as u64;
    } else if old_lines > new_lines {
      lines_removed += (old_lines - new_lines) as u64;
    }
  }

  EditStats {
    edit_count: edits.len(),
    lines_added,
    lines_removed,
    net_change: lines_added as i64 - lines_removed as i64,
  }
}

/// Heuristic failure signal for captured shell output.
///
/// Substring match only; benign output containing these words is
/// misclassified. Known limitation, kept as-is.
pub fn might_have_failed(output: &str) -> bool {
  let lower = output.to_lowercase();
  lower.contains("error") || lower.contains("failed") || lower.contains("not found")
}

/// Format a millisecond duration as `"999ms"`, `"1.5s"`, or `"1m 5s"`.
pub fn format_duration(ms: Option<i64>) -> String {
  let ms = match ms {
    Some(ms) if ms > 0 => ms,
    _ => return "0ms".to_string(),
  };

  if ms < 1000 {
    return format!("{}ms", ms);
  }

  if ms < 60_000 {
    return format!("{:.1}s", ms as f64 / 1000.0);
  }

  let minutes = ms / 60_000;
  let seconds = ((ms % 60_000) as f64 / 1000.0).round() as i64;
  format!("{}m {}s", minutes, seconds)
}

const TRACE_NAME_MAX: usize = 50;

/// Derive a descriptive trace name from the prompt, cut at a word boundary.
pub fn trace_name(prompt: Option<&str>, model: Option<&str>) -> String {
  let prompt = prompt.unwrap_or("");
  if prompt.is_empty() {
    return format!("Cursor {}", model.filter(|m| !m.is_empty()).unwrap_or("Agent"));
  }

  let cleaned = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
  if cleaned.chars().count() <= TRACE_NAME_MAX {
    return cleaned;
  }

  let truncated: String = cleaned.chars().take(TRACE_NAME_MAX).collect();
  match truncated.rfind(' ') {
    Some(idx) if idx > 30 => format!("{}...", &truncated[..idx]),
    _ => format!("{}...", truncated),
  }
}

/// Session identifier grouping conversations by workspace.
pub fn session_id(workspace_roots: Option<&Value>) -> String {
  let first_root = workspace_roots
    .and_then(Value::as_array)
    .and_then(|roots| roots.first())
    .and_then(Value::as_str);

  let Some(root) = first_root else {
    return "cursor-default-session".to_string();
  };

  let folder = root.rsplit('/').next().filter(|segment| !segment.is_empty()).unwrap_or(root);
  format!("cursor-{}", folder)
}
