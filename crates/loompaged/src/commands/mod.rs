//! Subcommands of the `loompage` binary.

use super::*;

pub mod gallery;
pub mod init;
pub mod providers;
pub mod search;
pub mod serve;

pub use gallery::{gallery, GalleryOptions};
pub use init::{init, InitOptions};
pub use providers::providers;
pub use search::{search, SearchOptions};
pub use serve::{serve, ServeOptions};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write a starter configuration file
  Init(InitOptions),

  /// Serve the image search HTTP API
  Serve(ServeOptions),

  /// Find a single image for a query, the way the book pipeline does
  Search(SearchOptions),

  /// Collect a browsable gallery of candidates from every provider
  Gallery(GalleryOptions),

  /// Show which providers are configured and in what order they are tried
  Providers,
}

/// Prints one candidate as a small tree.
fn print_candidate(candidate: &ImageCandidate) {
  let print_ready = if candidate.print_ready {
    style("print-ready").green()
  } else {
    style("not print-ready").yellow()
  };
  println!("   {} {}", TREE_BRANCH, style(&candidate.url).cyan());
  println!("   {} {}x{} ({})", TREE_BRANCH, candidate.width, candidate.height, print_ready);
  println!("   {} {}", TREE_BRANCH, candidate.attribution);
  println!("   {} {}", TREE_LEAF, style(&candidate.license).dim());
}
