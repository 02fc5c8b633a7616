//! Command line interface and HTTP service for the loompage image resolver.
//!
//! This crate wraps the `loompage` library in a single `loompage` binary. It supports:
//! - Running the resolver as an HTTP service for the book-generation pipeline
//! - One-off single-image and gallery searches from the terminal
//! - Inspecting which providers are configured
//! - Writing a starter configuration file
//!
//! # Usage
//!
//! ```bash
//! # Write a commented configuration file to the default location
//! loompage init
//!
//! # Serve the HTTP API
//! loompage serve --bind 0.0.0.0:8787 --log-dir /var/log/loompage
//!
//! # Find one image, anchored to a book topic
//! loompage search "mountain cabin, no people" --topic "Aspen Colorado"
//!
//! # Browse up to 30 candidates
//! loompage gallery "alpine lake" --limit 30
//! ```
//!
//! Output is colored for terminals; `--json` switches search output to machine-readable JSON.
//! Logging verbosity is raised with repeated `-v` flags, and `RUST_LOG` overrides it.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use loompage::{
  error::LoompageError, Config, DownloadTracker, ExclusionSet, Gallery, GalleryResult,
  ImageCandidate, ImageProvider, ImageQuery, ImageUsage, Orientation, ProviderKind,
  ProviderPriority, Resolution, Waterfall,
};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod commands;
pub mod error;
pub mod server;

use crate::{commands::*, error::*};

/// Prefix for information messages
static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
static ERROR_PREFIX: &str = "✗ ";
/// Branch character for tree structure
static TREE_BRANCH: &str = "├─";
/// Leaf character for tree structure (end of branch)
static TREE_LEAF: &str = "└─";

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Multi-source image resolver for illustrated e-books")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used (0-4)
/// * `log_dir` - When set, logs are also written to a daily-rolling file in this directory
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// The returned guard flushes the file writer when dropped and must be held until exit.
fn setup_logging(verbosity: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
  let stdout = fmt::layer()
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true);

  let Some(log_dir) = log_dir else {
    tracing_subscriber::registry().with(filter).with(stdout).try_init()?;
    return Ok(None);
  };

  std::fs::create_dir_all(log_dir)?;
  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "loompage.log"));
  tracing_subscriber::registry()
    .with(filter)
    .with(stdout)
    .with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer))
    .try_init()?;
  Ok(Some(guard))
}

/// Entry point for the loompage CLI application
///
/// Parses arguments, sets up logging, loads configuration (except for `init`, which creates
/// it) and executes the requested command.
///
/// # Errors
///
/// Returns `LoompagedError` for failures such as:
/// - Unreadable or invalid configuration
/// - An unusable bind address or port already in use
/// - File system errors while writing configuration or logs
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let log_dir = match &cli.command {
    Commands::Serve(options) => options.log_dir.clone(),
    _ => None,
  };
  let _guard = setup_logging(cli.verbose, log_dir.as_deref())?;

  let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
  match cli.command {
    Commands::Init(options) => init(&config_path, options),
    command => {
      let config = load_config(&config_path)?;
      match command {
        Commands::Serve(options) => serve(config, options).await,
        Commands::Search(options) => search(&config, options).await,
        Commands::Gallery(options) => gallery(&config, options).await,
        Commands::Providers => providers(&config),
        Commands::Init(options) => init(&config_path, options),
      }
    },
  }
}

/// Loads configuration, reporting failures in the terminal before propagating them.
fn load_config(path: &Path) -> Result<Config> {
  Config::load(path).map_err(|e| {
    eprintln!(
      "{} Failed to load configuration from {}: {}",
      style(ERROR_PREFIX).red(),
      path.display(),
      style(&e).red()
    );
    e.into()
  })
}
