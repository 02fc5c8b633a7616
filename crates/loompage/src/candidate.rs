//! The common result shape produced by every provider adapter.

use super::*;

/// Width at or above which an image is considered good enough for print.
pub const PRINT_READY_WIDTH: u32 = 1800;

/// One photograph offered by a provider.
///
/// Adapters create candidates from raw API hits and the orchestrators hand them to callers
/// unchanged; a candidate that fails a filter is dropped, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
  /// Where the candidate came from
  pub provider:     ProviderKind,
  /// Full-resolution image URL
  pub url:          String,
  /// Smaller preview URL for browsing
  pub thumbnail:    Option<String>,
  /// Pixel width of the full-resolution image
  pub width:        u32,
  /// Pixel height of the full-resolution image
  pub height:       u32,
  /// Credit line to print alongside the image
  pub attribution:  String,
  /// License label as reported by (or implied by) the provider
  pub license:      String,
  /// Whether the width meets [`PRINT_READY_WIDTH`]
  pub print_ready:  bool,
  /// Human-facing page for the photograph, when the provider has one
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_page:  Option<String>,
  /// Endpoint the provider asks to be pinged when the image is actually used
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tracking_url: Option<String>,
}

impl ImageCandidate {
  /// Builds a candidate, deriving the print-ready flag and attribution line.
  pub fn new(
    provider: ProviderKind,
    url: impl Into<String>,
    width: u32,
    height: u32,
    photographer: Option<&str>,
    license: impl Into<String>,
  ) -> Self {
    Self {
      provider,
      url: url.into(),
      thumbnail: None,
      width,
      height,
      attribution: attribution(photographer, provider),
      license: license.into(),
      print_ready: width >= PRINT_READY_WIDTH,
      source_page: None,
      tracking_url: None,
    }
  }

  /// Sets the thumbnail URL.
  pub fn with_thumbnail(mut self, thumbnail: Option<impl Into<String>>) -> Self {
    self.thumbnail = thumbnail.map(Into::into);
    self
  }

  /// Sets the human-facing source page.
  pub fn with_source_page(mut self, page: Option<impl Into<String>>) -> Self {
    self.source_page = page.map(Into::into);
    self
  }

  /// Sets the download-tracking endpoint.
  pub fn with_tracking_url(mut self, tracking_url: Option<impl Into<String>>) -> Self {
    self.tracking_url = tracking_url.map(Into::into);
    self
  }
}

/// Formats the credit line for a photograph.
///
/// ```
/// use loompage::{candidate::attribution, ProviderKind};
///
/// assert_eq!(attribution(Some("Ansel"), ProviderKind::Pexels), "Photo by Ansel via Pexels");
/// assert_eq!(attribution(Some("  "), ProviderKind::Pexels), "Source: Pexels");
/// assert_eq!(attribution(None, ProviderKind::Wikimedia), "Source: Wikimedia Commons");
/// ```
pub fn attribution(photographer: Option<&str>, provider: ProviderKind) -> String {
  match photographer.map(str::trim).filter(|name| !name.is_empty()) {
    Some(name) => format!("Photo by {name} via {}", provider.display_name()),
    None => format!("Source: {}", provider.display_name()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn print_ready_threshold_is_inclusive() {
    let at = ImageCandidate::new(ProviderKind::Pixabay, "https://x/a.jpg", 1800, 1200, None, "");
    let below = ImageCandidate::new(ProviderKind::Pixabay, "https://x/b.jpg", 1799, 1200, None, "");
    assert!(at.print_ready);
    assert!(!below.print_ready);
  }

  #[test]
  fn serializes_camel_case_and_skips_empty_links() {
    let candidate =
      ImageCandidate::new(ProviderKind::Unsplash, "https://x/a.jpg", 2400, 1600, Some("Jo"), "L")
        .with_thumbnail(Some("https://x/a-small.jpg"));
    let json = serde_json::to_value(&candidate).unwrap();
    assert_eq!(json["provider"], "unsplash");
    assert_eq!(json["printReady"], true);
    assert_eq!(json["attribution"], "Photo by Jo via Unsplash");
    assert!(json.get("trackingUrl").is_none());
  }
}
