//! Multi-result aggregation for human browsing.
//!
//! Unlike the [`waterfall`](crate::waterfall), the gallery asks every available provider at
//! once and merges what comes back. Providers earlier in the default priority order are asked
//! for more pages and get more slots in the merged list:
//!
//! | Position  | Pages fetched | Slots per round |
//! |-----------|---------------|-----------------|
//! | primary   | 3             | 3               |
//! | secondary | 2             | 2               |
//! | others    | 1             | 1               |
//!
//! No exclusion set applies; the caller picks from the gallery and records its choice. Within
//! one gallery a normalized URL appears at most once.

use futures::future::join_all;

use super::*;
use crate::{configuration::RetryConfig, query::significant_tokens};

/// Pages fetched from, and slots per round given to, providers by priority position.
const PROVIDER_WEIGHTS: [u32; 2] = [3, 2];

fn weight(position: usize) -> u32 { PROVIDER_WEIGHTS.get(position).copied().unwrap_or(1) }

/// The merged gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResult {
  /// Interleaved, de-duplicated candidates
  pub images:            Vec<ImageCandidate>,
  /// How many of `images` came from each provider
  pub sources:           BTreeMap<ProviderKind, usize>,
  /// How many of `images` are print-ready
  pub print_ready_count: usize,
}

impl GalleryResult {
  fn from_images(images: Vec<ImageCandidate>) -> Self {
    let mut sources = BTreeMap::new();
    for image in &images {
      *sources.entry(image.provider).or_insert(0) += 1;
    }
    let print_ready_count = images.iter().filter(|image| image.print_ready).count();
    Self { images, sources, print_ready_count }
  }

  /// Whether the gallery is empty.
  pub fn is_empty(&self) -> bool { self.images.is_empty() }
}

/// The concurrent multi-result aggregator.
#[derive(Clone)]
pub struct Gallery {
  providers: Vec<Arc<dyn ImageProvider>>,
  min_width: u32,
  page_size: u32,
  retry:     RetryConfig,
}

impl std::fmt::Debug for Gallery {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let kinds: Vec<_> = self.providers.iter().map(|p| p.kind()).collect();
    f.debug_struct("Gallery")
      .field("providers", &kinds)
      .field("min_width", &self.min_width)
      .field("page_size", &self.page_size)
      .field("retry", &self.retry)
      .finish()
  }
}

impl Gallery {
  /// Creates a gallery over the given providers with default thresholds.
  pub fn new(providers: Vec<Arc<dyn ImageProvider>>) -> Self {
    let search = configuration::SearchConfig::default();
    Self {
      providers,
      min_width: search.gallery_min_width,
      page_size: search.gallery_page_size,
      retry: RetryConfig::default(),
    }
  }

  /// Builds every provider adapter from configuration and environment credentials.
  pub fn from_config(config: &Config) -> Result<Self> {
    let providers = provider::build_providers(config, &config.credentials())?;
    Ok(Self::new(providers).with_settings(&config.search, &config.retry))
  }

  /// Applies thresholds and retry behaviour from configuration.
  pub fn with_settings(self, search: &configuration::SearchConfig, retry: &RetryConfig) -> Self {
    Self {
      min_width: search.gallery_min_width,
      page_size: search.gallery_page_size,
      retry: retry.clone(),
      ..self
    }
  }

  /// Collects up to `limit` images for `query`.
  ///
  /// The query's exclusion set is ignored. A query that cleans down to nothing, or a zero
  /// limit, yields an empty gallery without contacting any provider.
  pub async fn search(&self, query: &ImageQuery, limit: usize) -> GalleryResult {
    let Some(anchored) = query.prepared() else {
      info!("Gallery query \"{}\" has no searchable terms left", query.raw());
      return GalleryResult::default();
    };
    if limit == 0 {
      return GalleryResult::default();
    }

    let providers: Vec<_> = ProviderPriority::default()
      .arrange(&self.providers)
      .into_iter()
      .filter(|provider| provider.is_available())
      .collect();
    let relevance = significant_tokens(&anchored);
    let base = SearchRequest::gallery(self.min_width, self.page_size, 1)
      .with_orientation(query.orientation())
      .with_relevance(&relevance)
      .with_cover_rules(query.usage(), query.usage() == ImageUsage::Cover);

    debug!("Gallery \"{anchored}\" across {} provider(s)", providers.len());
    let fetches = providers.iter().enumerate().map(|(position, provider)| {
      let pages = 1..=weight(position);
      let anchored = anchored.as_str();
      let base = &base;
      async move {
        let pages = join_all(pages.map(|page| {
          let request = SearchRequest { page, ..base.clone() };
          async move { self.fetch_page(provider.as_ref(), anchored, &request).await }
        }))
        .await;
        pages.into_iter().flatten().collect::<Vec<_>>()
      }
    });
    let per_provider = join_all(fetches).await;

    let weights: Vec<u32> = (0..per_provider.len()).map(weight).collect();
    let images = interleave(per_provider, &weights, limit);
    let result = GalleryResult::from_images(images);
    info!(
      "Gallery \"{anchored}\": {} image(s), {} print-ready",
      result.images.len(),
      result.print_ready_count
    );
    result
  }

  /// One provider page, retrying transient failures with exponential backoff.
  async fn fetch_page(
    &self,
    provider: &dyn ImageProvider,
    query: &str,
    request: &SearchRequest<'_>,
  ) -> Vec<ImageCandidate> {
    let kind = provider.kind();
    let mut attempt = 1;
    loop {
      match provider.search(query, request).await {
        Ok(found) => {
          trace!("{kind} page {}: {} hit(s)", request.page, found.len());
          return found.into_iter().filter(|image| image.width >= self.min_width).collect();
        },
        Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
          let delay = self.retry.delay_for(attempt);
          warn!("{kind} page {} failed ({e}), retrying in {delay:?}", request.page);
          tokio::time::sleep(delay).await;
          attempt += 1;
        },
        Err(e) => {
          warn!("{kind} page {} failed after {attempt} attempt(s): {e}", request.page);
          return Vec::new();
        },
      }
    }
  }
}

/// Merges per-provider lists round-robin, taking up to `weights[i]` new images from list `i`
/// per round. Duplicate normalized URLs are dropped and do not use up a slot.
fn interleave(
  sources: Vec<Vec<ImageCandidate>>,
  weights: &[u32],
  limit: usize,
) -> Vec<ImageCandidate> {
  let mut queues: Vec<_> = sources.into_iter().map(|images| images.into_iter()).collect();
  let mut seen = ExclusionSet::new();
  let mut merged = Vec::new();
  let mut exhausted = vec![false; queues.len()];

  while merged.len() < limit && exhausted.iter().any(|done| !done) {
    for (index, queue) in queues.iter_mut().enumerate() {
      let mut taken = 0;
      while taken < weights[index] && merged.len() < limit {
        let Some(image) = queue.next() else {
          exhausted[index] = true;
          break;
        };
        if seen.insert(&image.url) {
          merged.push(image);
          taken += 1;
        }
      }
    }
  }
  merged
}
