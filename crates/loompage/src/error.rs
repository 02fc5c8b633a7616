//! Error types for the loompage library.
//!
//! Most failures in this crate are deliberately *not* surfaced to the book-generation caller:
//! a provider that errors is logged and treated as having returned nothing. The error type
//! exists so that adapters can report precisely what went wrong, and so that orchestrators can
//! decide between "move on" and "retry".
//!
//! # Examples
//!
//! ```
//! use loompage::error::LoompageError;
//!
//! let err = LoompageError::Transient { provider: "pexels".into(), status: 429 };
//! assert!(err.is_transient());
//!
//! let err = LoompageError::ProviderStatus { provider: "pexels".into(), status: 403 };
//! assert!(!err.is_transient());
//! ```

use thiserror::Error;

/// Error type alias used for the [`loompage`](crate) crate.
pub type Result<T> = core::result::Result<T, LoompageError>;

/// Errors that can occur while sourcing images.
#[derive(Error, Debug)]
pub enum LoompageError {
  /// A network request failed before a response arrived.
  ///
  /// This covers DNS and connection failures, TLS errors and request timeouts.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A provider answered with a rate-limit or server error (HTTP 429 or 5xx).
  ///
  /// These are the only HTTP failures worth retrying, and only in contexts that opt in.
  #[error("{provider} returned a transient error (HTTP {status})")]
  Transient {
    /// Provider identifier
    provider: String,
    /// HTTP status code
    status:   u16,
  },

  /// A provider answered with a permanent error status (4xx other than 429).
  #[error("{provider} rejected the request (HTTP {status})")]
  ProviderStatus {
    /// Provider identifier
    provider: String,
    /// HTTP status code
    status:   u16,
  },

  /// A provider response could not be decoded into its expected schema.
  #[error("{provider} returned a malformed response: {reason}")]
  MalformedResponse {
    /// Provider identifier
    provider: String,
    /// What failed to decode
    reason:   String,
  },

  /// The inbound query was rejected before reaching any provider.
  #[error("Invalid query: {0}")]
  InvalidQuery(String),

  /// An orientation string was neither `landscape` nor `portrait`.
  #[error("Invalid orientation \"{0}\", expected `landscape` or `portrait`")]
  InvalidOrientation(String),

  /// A provider identifier string did not name a known provider.
  #[error("Unknown provider \"{0}\"")]
  UnknownProvider(String),

  /// A file system operation failed, typically while reading or writing configuration.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// JSON encoding or decoding failed outside of a provider response.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be serialized.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// The configuration is internally inconsistent.
  #[error("{0}")]
  Config(String),
}

impl LoompageError {
  /// Whether this failure is worth retrying with backoff.
  ///
  /// Rate limits, server errors, timeouts and connection failures are transient; everything
  /// else (bad credentials, malformed bodies, invalid input) will fail the same way again.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Transient { .. } => true,
      Self::Network(e) => e.is_timeout() || e.is_connect(),
      _ => false,
    }
  }
}
