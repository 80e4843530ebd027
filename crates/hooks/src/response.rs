//! Hook decision types returned to Cursor.

use serde::Serialize;

/// Permission decision for gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
  Allow,
  Deny,
}

/// Structured response written back on the hook's result channel.
///
/// The variants cover the three shapes Cursor accepts: a continue flag for
/// prompt submission, a permission decision for gated operations, and an
/// empty acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HookResponse {
  Continue {
    #[serde(rename = "continue")]
    cont: bool,
  },
  Permission { permission: Permission },
  Empty {},
}

impl HookResponse {
  pub fn cont() -> Self {
    Self::Continue { cont: true }
  }

  pub fn allow() -> Self {
    Self::Permission {
      permission: Permission::Allow,
    }
  }

  pub fn empty() -> Self {
    Self::Empty {}
  }
}
