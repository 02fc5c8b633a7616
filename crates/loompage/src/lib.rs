//! Multi-source image sourcing for illustrated e-books.
//!
//! `loompage` finds photographs for generated book chapters and covers by querying several
//! external image providers and applying resolution, license and duplicate filters:
//!
//! - Query normalization: noise-phrase removal, topic anchoring and fallback queries
//! - Provider adapters for Unsplash, Pixabay, Pexels and Wikimedia Commons
//! - A sequential single-result waterfall with per-provider fallback cycles
//! - A concurrent gallery aggregator that interleaves results from every provider
//! - Session-scoped de-duplication so one book never reuses the same photograph
//!
//! # Features
//!
//! - **Graceful degradation**: a provider with no credential simply yields nothing
//! - **Never fails the book**: "nothing found" is a value, not an error
//! - **Provider-agnostic orchestration**: everything runs against the [`ImageProvider`] trait,
//!   so tests swap in fakes
//!
//! # Getting Started
//!
//! ```no_run
//! use loompage::{prelude::*, Config, ImageQuery, Orientation, Resolution, Waterfall};
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::load(Config::default_path())?;
//!   let waterfall = Waterfall::from_config(&config)?;
//!
//!   let query = ImageQuery::new("no people mountain cabin")
//!     .with_orientation(Orientation::Landscape)
//!     .with_topic("Aspen Colorado");
//!
//!   match waterfall.resolve(&query).await {
//!     Resolution::Found(image) => println!("{} ({})", image.url, image.attribution),
//!     other => println!("{}", other.message()),
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`query`]: Query cleaning, anchoring, fallbacks and keyword heuristics
//! - [`candidate`]: The common image result shape
//! - [`exclusion`]: URL normalization and the session exclusion set
//! - [`provider`]: The [`ImageProvider`] trait and one adapter per source
//! - [`waterfall`]: Single-result resolution
//! - [`gallery`]: Multi-result aggregation
//! - [`tracking`]: Post-selection download tracking
//! - [`session`]: One book-generation session
//! - [`configuration`]: TOML configuration and credentials

#![warn(missing_docs)]

use std::{
  collections::{BTreeMap, HashSet},
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod candidate;
pub mod configuration;
pub mod error;
pub mod exclusion;
pub mod gallery;
pub mod provider;
pub mod query;
pub mod session;
pub mod tracking;
pub mod waterfall;

pub use candidate::ImageCandidate;
pub use configuration::{Config, Credentials};
pub use exclusion::{normalize_url, ExclusionSet};
pub use gallery::{Gallery, GalleryResult};
pub use provider::{ImageProvider, ProviderKind, ProviderPriority};
pub use query::{ImageQuery, ImageUsage, Orientation};
pub use session::ImageSession;
pub use tracking::DownloadTracker;
pub use waterfall::{Resolution, Waterfall};

use crate::{error::*, provider::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use loompage::prelude::*;
///
/// fn describe(provider: &dyn ImageProvider) -> String { provider.kind().to_string() }
/// ```
pub mod prelude {
  pub use crate::{
    error::{LoompageError, Result},
    provider::ImageProvider,
  };
}
