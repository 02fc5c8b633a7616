//! Session-scoped de-duplication of image URLs.
//!
//! Providers hand out the same photograph under many URLs: Unsplash appends sizing and
//! tracking parameters, Pexels adds `auto=compress`, CDNs add cache busters. Two URLs are the
//! same image for our purposes when their scheme, host and path agree.

use url::Url;

use super::*;

/// Reduces an image URL to scheme, host and path.
///
/// Query strings and fragments are dropped and the scheme and host are lower-cased. Text that
/// does not parse as a URL is trimmed, lower-cased and cut at the first `?` or `#`.
///
/// ```
/// use loompage::normalize_url;
///
/// assert_eq!(
///   normalize_url("https://Images.Unsplash.com/photo-123?ixid=abc&w=1080#top"),
///   "https://images.unsplash.com/photo-123"
/// );
/// assert_eq!(normalize_url("  not a url?x=1 "), "not a url");
/// ```
pub fn normalize_url(raw: &str) -> String {
  let raw = raw.trim();
  match Url::parse(raw) {
    Ok(url) => {
      let host = url.host_str().unwrap_or_default().to_lowercase();
      let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
      format!("{}://{host}{port}{}", url.scheme(), url.path())
    },
    Err(_) => {
      let end = raw.find(['?', '#']).unwrap_or(raw.len());
      raw[..end].trim().to_lowercase()
    },
  }
}

/// The normalized URLs already used in one book-generation session.
///
/// The set only grows: there is no way to remove an entry, so once an image has been placed
/// in a book it can never be offered again within that book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
  /// Normalized URLs
  urls: HashSet<String>,
}

impl ExclusionSet {
  /// Creates an empty set.
  pub fn new() -> Self { Self::default() }

  /// Creates a set from raw URLs, normalizing each one.
  pub fn from_urls<I, S>(urls: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>, {
    let mut set = Self::new();
    for url in urls {
      set.insert(url.as_ref());
    }
    set
  }

  /// Adds a URL. Returns `true` if it was not already present.
  pub fn insert(&mut self, url: &str) -> bool {
    let normalized = normalize_url(url);
    if normalized.is_empty() {
      return false;
    }
    self.urls.insert(normalized)
  }

  /// Whether the URL, once normalized, is in the set.
  pub fn contains(&self, url: &str) -> bool { self.urls.contains(&normalize_url(url)) }

  /// Number of distinct normalized URLs.
  pub fn len(&self) -> usize { self.urls.len() }

  /// Whether the set is empty.
  pub fn is_empty(&self) -> bool { self.urls.is_empty() }

  /// Iterates over the normalized URLs in no particular order.
  pub fn iter(&self) -> impl Iterator<Item = &str> { self.urls.iter().map(String::as_str) }
}

impl<S: AsRef<str>> Extend<S> for ExclusionSet {
  fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
    for url in iter {
      self.insert(url.as_ref());
    }
  }
}
