//! Hook event types and parsing.

use serde::{Deserialize, Serialize};

/// Hook event types emitted by Cursor.
///
/// The set is closed: names outside it are a handled case at dispatch, not an
/// error (see `UnknownEvent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookEvent {
  BeforeSubmitPrompt,
  AfterAgentResponse,
  AfterAgentThought,
  BeforeShellExecution,
  AfterShellExecution,
  #[serde(rename = "beforeMCPExecution")]
  BeforeMcpExecution,
  #[serde(rename = "afterMCPExecution")]
  AfterMcpExecution,
  BeforeReadFile,
  AfterFileEdit,
  Stop,
  BeforeTabFileRead,
  AfterTabFileEdit,
}

impl HookEvent {
  /// The wire name Cursor uses for this event.
  pub fn name(&self) -> &'static str {
    match self {
      Self::BeforeSubmitPrompt => "beforeSubmitPrompt",
      Self::AfterAgentResponse => "afterAgentResponse",
      Self::AfterAgentThought => "afterAgentThought",
      Self::BeforeShellExecution => "beforeShellExecution",
      Self::AfterShellExecution => "afterShellExecution",
      Self::BeforeMcpExecution => "beforeMCPExecution",
      Self::AfterMcpExecution => "afterMCPExecution",
      Self::BeforeReadFile => "beforeReadFile",
      Self::AfterFileEdit => "afterFileEdit",
      Self::Stop => "stop",
      Self::BeforeTabFileRead => "beforeTabFileRead",
      Self::AfterTabFileEdit => "afterTabFileEdit",
    }
  }
}

impl std::fmt::Display for HookEvent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// An event name outside the fixed dispatch set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl std::fmt::Display for UnknownEvent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "unknown hook event: {}", self.0)
  }
}

impl std::error::Error for UnknownEvent {}

impl std::str::FromStr for HookEvent {
  type Err = UnknownEvent;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beforeSubmitPrompt" => Ok(Self::BeforeSubmitPrompt),
      "afterAgentResponse" => Ok(Self::AfterAgentResponse),
      "afterAgentThought" => Ok(Self::AfterAgentThought),
      "beforeShellExecution" => Ok(Self::BeforeShellExecution),
      "afterShellExecution" => Ok(Self::AfterShellExecution),
      "beforeMCPExecution" => Ok(Self::BeforeMcpExecution),
      "afterMCPExecution" => Ok(Self::AfterMcpExecution),
      "beforeReadFile" => Ok(Self::BeforeReadFile),
      "afterFileEdit" => Ok(Self::AfterFileEdit),
      "stop" => Ok(Self::Stop),
      "beforeTabFileRead" => Ok(Self::BeforeTabFileRead),
      "afterTabFileEdit" => Ok(Self::AfterTabFileEdit),
      _ => Err(UnknownEvent(s.to_string())),
    }
  }
}
