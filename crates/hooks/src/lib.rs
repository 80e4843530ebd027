pub mod dispatch;
pub mod handlers;
pub mod response;
pub mod scores;

pub use dispatch::{dispatch, get_or_create_trace};
pub use response::{HookResponse, Permission};
pub use scores::{CompletionScore, completion_scores};
