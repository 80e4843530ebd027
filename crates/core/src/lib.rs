pub mod config;
pub mod error;
pub mod event;
pub mod normalize;
pub mod tags;

pub use config::{DEFAULT_BASE_URL, LangfuseConfig};
pub use error::{Error, Result};
pub use event::{HookEvent, UnknownEvent};
pub use normalize::{
  EditStats, edit_stats, file_extension, file_name, format_duration, might_have_failed, session_id, trace_name,
  truncate_chars,
};
pub use tags::{generate_tags, model_tag};
