//! Error types for the `loompage` binary.

use loompage::error::LoompageError;
use thiserror::Error;

/// Error type alias used for the `loompaged` crate.
pub type Result<T> = core::result::Result<T, LoompagedError>;

/// Errors that can stop the CLI or the service.
#[derive(Error, Debug)]
pub enum LoompagedError {
  /// An error from the resolver library, most often configuration.
  #[error(transparent)]
  Loompage(#[from] LoompageError),

  /// A file system or socket operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The `--bind` address or `server.bind` setting is not a socket address.
  #[error("Invalid bind address: {0}")]
  Address(#[from] std::net::AddrParseError),

  /// Results could not be encoded as JSON for output.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A global tracing subscriber was already installed.
  #[error("Failed to initialize logging: {0}")]
  Logging(#[from] tracing_subscriber::util::TryInitError),
}
