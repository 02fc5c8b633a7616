//! Image provider adapters.
//!
//! Every external image source sits behind the [`ImageProvider`] trait. An adapter performs
//! exactly one HTTP search call per invocation, maps the provider's response schema into
//! [`ImageCandidate`]s and applies its own filters. The orchestrators in
//! [`waterfall`](crate::waterfall) and [`gallery`](crate::gallery) only ever see the trait, so
//! they can be exercised against fakes.
//!
//! # Contract
//!
//! - A provider without its credential returns `Ok(vec![])` without touching the network.
//! - Non-success statuses become errors ([`LoompageError::Transient`] for 429 and 5xx,
//!   [`LoompageError::ProviderStatus`] otherwise); callers decide whether to retry or move on.
//! - Hits are scanned in provider order. In [`SearchMode::Single`] the first acceptable hit is
//!   returned; in [`SearchMode::Gallery`] up to `page_size` hits are collected.
//!
//! # Examples
//!
//! ```no_run
//! use loompage::{
//!   provider::{ImageProvider, SearchRequest},
//!   Config,
//! };
//!
//! # async fn example() -> loompage::error::Result<()> {
//! let config = Config::default();
//! for provider in loompage::provider::build_providers(&config, &config.credentials())? {
//!   let request = SearchRequest::single(1600);
//!   let hits = provider.search("lisbon tram", &request).await?;
//!   println!("{}: {} hit(s)", provider.kind(), hits.len());
//! }
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;

use super::*;

mod pexels;
mod pixabay;
mod unsplash;
mod wikimedia;

pub use pexels::PexelsProvider;
pub use pixabay::PixabayProvider;
pub use unsplash::UnsplashProvider;
pub use wikimedia::WikimediaProvider;

/// The external image sources this crate knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  /// unsplash.com, curated high-resolution stock photography
  Unsplash,
  /// pixabay.com, large free stock library
  Pixabay,
  /// pexels.com, free stock photography
  Pexels,
  /// Wikimedia Commons, public-domain and freely licensed media
  Wikimedia,
}

impl ProviderKind {
  /// Every provider, in default waterfall order.
  pub const ALL: [ProviderKind; 4] = [Self::Unsplash, Self::Pixabay, Self::Pexels, Self::Wikimedia];

  /// Stable lowercase identifier.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Unsplash => "unsplash",
      Self::Pixabay => "pixabay",
      Self::Pexels => "pexels",
      Self::Wikimedia => "wikimedia",
    }
  }

  /// Name used in attribution lines.
  pub fn display_name(&self) -> &'static str {
    match self {
      Self::Unsplash => "Unsplash",
      Self::Pixabay => "Pixabay",
      Self::Pexels => "Pexels",
      Self::Wikimedia => "Wikimedia Commons",
    }
  }
}

impl Display for ProviderKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ProviderKind {
  type Err = LoompageError;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| LoompageError::UnknownProvider(s.to_string()))
  }
}

/// The order in which providers are tried.
///
/// ```
/// use loompage::{ProviderKind, ProviderPriority};
///
/// let order = ProviderPriority::for_query("Eiffel Tower at dusk");
/// assert_eq!(order.as_slice()[0], ProviderKind::Wikimedia);
/// assert_eq!(order.as_slice()[1], ProviderKind::Unsplash);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPriority(Vec<ProviderKind>);

impl Default for ProviderPriority {
  fn default() -> Self { Self(ProviderKind::ALL.to_vec()) }
}

impl ProviderPriority {
  /// Unsplash, Pixabay, Pexels, Wikimedia.
  pub fn new() -> Self { Self::default() }

  /// Wikimedia first, everything else in default order.
  pub fn landmark() -> Self {
    let mut order = vec![ProviderKind::Wikimedia];
    order.extend(ProviderKind::ALL.into_iter().filter(|k| *k != ProviderKind::Wikimedia));
    Self(order)
  }

  /// Picks the order for a prepared query.
  pub fn for_query(query: &str) -> Self {
    if query::is_landmark_query(query) {
      Self::landmark()
    } else {
      Self::default()
    }
  }

  /// The kinds, highest priority first.
  pub fn as_slice(&self) -> &[ProviderKind] { &self.0 }

  /// Sorts providers into this order, dropping those whose kind is not listed.
  pub fn arrange(&self, providers: &[Arc<dyn ImageProvider>]) -> Vec<Arc<dyn ImageProvider>> {
    self
      .0
      .iter()
      .flat_map(|kind| providers.iter().filter(move |p| p.kind() == *kind))
      .cloned()
      .collect()
  }
}

/// Whether the caller wants one image or a page of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
  /// Stop at the first acceptable hit
  Single,
  /// Collect up to the page size
  Gallery,
}

/// Per-call parameters shared by all adapters.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
  /// Requested orientation
  pub orientation:       Orientation,
  /// Number of hits to ask the provider for
  pub page_size:         u32,
  /// One-based page number
  pub page:              u32,
  /// Narrowest acceptable image
  pub min_width:         u32,
  /// One hit or many
  pub mode:              SearchMode,
  /// Where the image is going
  pub usage:             ImageUsage,
  /// Apply landmark/cover rules (currently only meaningful to Wikimedia)
  pub cover_rules:       bool,
  /// Narrowest acceptable image when `cover_rules` is set
  pub cover_min_width:   u32,
  /// Whether share-alike / GFDL licensed images may be used on covers
  pub allow_share_alike: bool,
  /// URLs that must not be returned
  pub exclude:           Option<&'a ExclusionSet>,
  /// Significant tokens a hit should mention, for providers that filter on relevance
  pub relevance:         &'a [String],
}

impl<'a> SearchRequest<'a> {
  /// A first-hit request with the given minimum width.
  pub fn single(min_width: u32) -> Self {
    Self {
      orientation: Orientation::default(),
      page_size: 10,
      page: 1,
      min_width,
      mode: SearchMode::Single,
      usage: ImageUsage::default(),
      cover_rules: false,
      cover_min_width: candidate::PRINT_READY_WIDTH,
      allow_share_alike: false,
      exclude: None,
      relevance: &[],
    }
  }

  /// A page request with the given minimum width.
  pub fn gallery(min_width: u32, page_size: u32, page: u32) -> Self {
    Self { mode: SearchMode::Gallery, page_size, page: page.max(1), ..Self::single(min_width) }
  }

  /// Sets the orientation.
  pub fn with_orientation(self, orientation: Orientation) -> Self { Self { orientation, ..self } }

  /// Sets the exclusion set.
  pub fn with_exclude(self, exclude: &'a ExclusionSet) -> Self {
    Self { exclude: Some(exclude), ..self }
  }

  /// Sets the relevance tokens.
  pub fn with_relevance(self, relevance: &'a [String]) -> Self { Self { relevance, ..self } }

  /// Sets the usage and whether landmark/cover rules apply.
  pub fn with_cover_rules(self, usage: ImageUsage, cover_rules: bool) -> Self {
    Self { usage, cover_rules, ..self }
  }

  /// Maximum number of candidates an adapter should return for this request.
  pub fn limit(&self) -> usize {
    match self.mode {
      SearchMode::Single => 1,
      SearchMode::Gallery => self.page_size as usize,
    }
  }
}

/// An external image search service.
///
/// Implementations hold their own credential and HTTP client. They must be cheap to share
/// (`Arc<dyn ImageProvider>`) and safe to call concurrently.
#[async_trait]
pub trait ImageProvider: Send + Sync {
  /// Which source this is.
  fn kind(&self) -> ProviderKind;

  /// Whether the provider has what it needs (credential, enabled flag) to search.
  fn is_available(&self) -> bool;

  /// Runs one search call.
  ///
  /// # Arguments
  ///
  /// * `query` - Prepared query text
  /// * `request` - Orientation, paging, thresholds and exclusions
  ///
  /// # Returns
  ///
  /// Accepted candidates in provider order: at most one in [`SearchMode::Single`], at most
  /// `page_size` in [`SearchMode::Gallery`]. Unavailable providers return an empty list.
  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>>;
}

/// Builds every adapter from configuration, sharing one HTTP client.
pub fn build_providers(
  config: &Config,
  credentials: &Credentials,
) -> Result<Vec<Arc<dyn ImageProvider>>> {
  let client = http_client(config.search.request_timeout())?;
  let providers = &config.providers;

  let enabled_key = |enabled: bool, key: Option<&str>| key.filter(|_| enabled).map(String::from);

  Ok(vec![
    Arc::new(UnsplashProvider::new(
      client.clone(),
      enabled_key(providers.unsplash.enabled, credentials.get(ProviderKind::Unsplash)),
    )),
    Arc::new(PixabayProvider::new(
      client.clone(),
      enabled_key(providers.pixabay.enabled, credentials.get(ProviderKind::Pixabay)),
    )),
    Arc::new(PexelsProvider::new(
      client.clone(),
      enabled_key(providers.pexels.enabled, credentials.get(ProviderKind::Pexels)),
    )),
    Arc::new(
      WikimediaProvider::new(client, providers.wikimedia.user_agent.clone())
        .with_enabled(providers.wikimedia.enabled),
    ),
  ])
}

/// Creates the HTTP client used for provider calls. Every request carries `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
  Ok(
    reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("loompage/", env!("CARGO_PKG_VERSION")))
      .build()?,
  )
}

/// Sends a request and decodes its JSON body, mapping HTTP failures onto the error taxonomy.
async fn fetch_json<T: DeserializeOwned>(
  kind: ProviderKind,
  request: reqwest::RequestBuilder,
) -> Result<T> {
  let response = request.send().await?;
  let status = response.status();
  if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
    return Err(LoompageError::Transient { provider: kind.to_string(), status: status.as_u16() });
  }
  if !status.is_success() {
    return Err(LoompageError::ProviderStatus {
      provider: kind.to_string(),
      status:   status.as_u16(),
    });
  }

  let data = response.bytes().await?;
  trace!("{kind} response: {}", String::from_utf8_lossy(&data));
  serde_json::from_slice(&data).map_err(|e| LoompageError::MalformedResponse {
    provider: kind.to_string(),
    reason:   e.to_string(),
  })
}

/// Applies the filters common to every provider and enforces the result limit.
///
/// Candidates arrive in provider order and have already passed any provider-specific checks.
fn select<I>(
  kind: ProviderKind,
  hits: I,
  request: &SearchRequest<'_>,
  min_width: u32,
) -> Vec<ImageCandidate>
where I: IntoIterator<Item = ImageCandidate> {
  let limit = request.limit();
  let mut accepted = Vec::new();
  for candidate in hits {
    if candidate.width < min_width {
      trace!("{kind}: rejecting {} ({}px < {min_width}px)", candidate.url, candidate.width);
      continue;
    }
    if request.exclude.is_some_and(|excluded| excluded.contains(&candidate.url)) {
      trace!("{kind}: rejecting {} (already used)", candidate.url);
      continue;
    }
    accepted.push(candidate);
    if accepted.len() >= limit {
      break;
    }
  }
  accepted
}
