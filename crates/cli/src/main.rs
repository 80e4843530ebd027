use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cursorfuse_core::LangfuseConfig;
use hooks::{dispatch, get_or_create_trace};
use langfuse::LangfuseClient;
use tracing::error;

#[derive(Parser)]
#[command(name = "cursorfuse")]
#[command(about = "Forward Cursor hook events to Langfuse")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Handle a hook event (JSON payload on stdin, decision JSON on stdout)
  Hook { name: String },
  /// Check configuration and backend connectivity
  Doctor,
}

/// How long the final flush may block on outbound network I/O.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Logging goes to stderr: stdout is the hook result channel.
fn init_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
    .with_writer(std::io::stderr)
    .init();
}

/// Read hook input from stdin (JSON payload from Cursor)
fn read_hook_input() -> Result<serde_json::Value> {
  let mut input = String::new();
  std::io::stdin().read_to_string(&mut input)?;

  if input.trim().is_empty() {
    return Ok(serde_json::Value::Object(serde_json::Map::new()));
  }

  serde_json::from_str(&input).context("Invalid JSON in hook input")
}

#[tokio::main]
async fn main() -> Result<()> {
  init_logging();

  let cli = Cli::parse();

  match cli.command {
    Commands::Hook { name } => cmd_hook(&name).await,
    Commands::Doctor => cmd_doctor().await,
  }
}

/// Handle a hook event
async fn cmd_hook(name: &str) -> Result<()> {
  let input = read_hook_input().context("Failed to read hook input")?;

  let config = LangfuseConfig::load().context("Failed to load Langfuse configuration")?;
  let client = LangfuseClient::new(config).context("Failed to build Langfuse client")?;

  let trace = get_or_create_trace(&client, name, &input);
  let response = dispatch(&trace, name, &input);

  // The decision goes out before any network I/O: observability must
  // never block the workflow it observes
  match &response {
    Some(response) => println!("{}", serde_json::to_string(response)?),
    None => println!("null"),
  }

  match tokio::time::timeout(FLUSH_TIMEOUT, client.shutdown()).await {
    Ok(Ok(())) => Ok(()),
    Ok(Err(e)) => {
      error!("Failed to flush trace data: {}", e);
      std::process::exit(1);
    }
    Err(_) => {
      error!("Timed out flushing trace data after {:?}", FLUSH_TIMEOUT);
      std::process::exit(1);
    }
  }
}

/// Check configuration and backend connectivity
async fn cmd_doctor() -> Result<()> {
  println!("Cursorfuse Health Check");
  println!("=======================\n");

  let config = match LangfuseConfig::load() {
    Ok(config) => {
      println!("Config:     OK");
      println!("Base URL:   {}", config.base_url);
      config
    }
    Err(e) => {
      println!("Config:     MISSING ({})", e);
      println!("\nSet LANGFUSE_PUBLIC_KEY and LANGFUSE_SECRET_KEY, or create .cursorfuse.toml");
      std::process::exit(1);
    }
  };

  let client = LangfuseClient::new(config).context("Failed to build Langfuse client")?;
  let health = client.health().await;

  if health.available {
    match health.version {
      Some(version) => println!("Backend:    AVAILABLE (version {})", version),
      None => println!("Backend:    AVAILABLE"),
    }
    Ok(())
  } else {
    println!("Backend:    NOT REACHABLE");
    std::process::exit(1);
  }
}
