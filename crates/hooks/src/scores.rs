//! Completion scoring for stop events.

/// A named, valued, optionally-commented trace annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionScore {
  pub name: &'static str,
  pub value: f64,
  pub comment: String,
}

/// Derive completion and efficiency scores from an agent run outcome.
///
/// A missing or non-numeric loop count skips the efficiency score without
/// error.
pub fn completion_scores(status: &str, loop_count: Option<f64>) -> Vec<CompletionScore> {
  let (value, comment) = match status {
    "completed" => (1.0, "Agent completed successfully".to_string()),
    "aborted" => (0.5, "Agent was aborted by user".to_string()),
    "error" => (0.0, "Agent encountered an error".to_string()),
    other => (0.5, format!("Unknown status: {}", other)),
  };

  let mut scores = vec![CompletionScore {
    name: "completion_status",
    value,
    comment,
  }];

  if let Some(loops) = loop_count {
    // Fewer loops score higher; 10+ loops bottoms out at zero
    let efficiency = (1.0 - loops / 10.0).max(0.0);
    scores.push(CompletionScore {
      name: "efficiency",
      value: efficiency,
      comment: format!("Completed in {} loops", loops),
    });
  }

  scores
}
