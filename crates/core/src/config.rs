//! Langfuse backend configuration.
//!
//! Config priority: process environment > project-relative (.cursorfuse.toml)
//! > user (~/.config/cursorfuse/config.toml). Missing credentials are a hard
//! error: without keys there is nowhere to deliver.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://cloud.langfuse.com";

const ENV_PUBLIC_KEY: &str = "LANGFUSE_PUBLIC_KEY";
const ENV_SECRET_KEY: &str = "LANGFUSE_SECRET_KEY";
const ENV_BASE_URL: &str = "LANGFUSE_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LangfuseConfig {
  pub public_key: String,
  pub secret_key: String,
  pub base_url: String,
}

/// Partial config as read from a TOML file; any field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FileConfig {
  #[serde(default)]
  public_key: Option<String>,
  #[serde(default)]
  secret_key: Option<String>,
  #[serde(default)]
  base_url: Option<String>,
}

impl LangfuseConfig {
  /// Load configuration for the current working directory.
  pub fn load() -> Result<Self> {
    let cwd = std::env::current_dir()?;
    Self::load_for_dir(&cwd)
  }

  /// Load configuration, searching `dir` for a project config file.
  pub fn load_for_dir(dir: &Path) -> Result<Self> {
    let mut search = vec![Self::project_config_path(dir)];
    if let Some(user) = Self::user_config_path() {
      search.push(user);
    }
    let file = read_first_config(&search);

    resolve(
      env_var(ENV_PUBLIC_KEY),
      env_var(ENV_SECRET_KEY),
      env_var(ENV_BASE_URL),
      file,
    )
  }

  /// Project-local config file path.
  pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".cursorfuse.toml")
  }

  /// User-level config file path.
  pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cursorfuse").join("config.toml"))
  }
}

fn env_var(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read the first parseable config file from the search path.
fn read_first_config(paths: &[PathBuf]) -> Option<FileConfig> {
  for path in paths {
    if !path.exists() {
      continue;
    }
    if let Ok(contents) = std::fs::read_to_string(path)
      && let Ok(config) = toml::from_str::<FileConfig>(&contents)
    {
      return Some(config);
    }
  }
  None
}

fn resolve(
  env_public: Option<String>,
  env_secret: Option<String>,
  env_base: Option<String>,
  file: Option<FileConfig>,
) -> Result<LangfuseConfig> {
  let file = file.unwrap_or_default();

  let public_key = env_public
    .or(file.public_key)
    .ok_or_else(|| Error::Config(format!("{} is not set and no config file provides public_key", ENV_PUBLIC_KEY)))?;

  let secret_key = env_secret
    .or(file.secret_key)
    .ok_or_else(|| Error::Config(format!("{} is not set and no config file provides secret_key", ENV_SECRET_KEY)))?;

  let base_url = env_base
    .or(file.base_url)
    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

  Ok(LangfuseConfig {
    public_key,
    secret_key,
    base_url: base_url.trim_end_matches('/').to_string(),
  })
}
