//! Single-result resolution.
//!
//! The waterfall tries providers one at a time, in priority order, and gives each one a full
//! cycle of queries (the anchored query, then its fallbacks) before moving on. The first
//! acceptable candidate wins. When every provider has been exhausted a single broad
//! "emergency" query is tried against all of them again.
//!
//! Provider failures of any kind are logged and treated as "no results from this provider";
//! nothing is retried in place. Running out of options is reported as
//! [`Resolution::NotFound`], never as an error.

use super::*;
use crate::query::{
  anchor_token, generate_fallback_queries, is_landmark_query, is_visual_topic, significant_tokens,
};

/// Outcome of a single-result search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// An image was selected.
  Found(ImageCandidate),
  /// The query was empty once noise was removed, so no provider was contacted.
  NoSuitableQuery,
  /// Every provider and every query was tried without success.
  NotFound,
}

impl Resolution {
  /// The selected candidate, if any.
  pub fn into_candidate(self) -> Option<ImageCandidate> {
    match self {
      Self::Found(candidate) => Some(candidate),
      _ => None,
    }
  }

  /// Whether an image was selected.
  pub fn is_found(&self) -> bool { matches!(self, Self::Found(_)) }

  /// A human-readable summary, suitable for the `message` field of a "nothing found" reply.
  pub fn message(&self) -> String {
    match self {
      Self::Found(candidate) => format!("Found image from {}", candidate.provider.display_name()),
      Self::NoSuitableQuery => "No suitable search terms remained after cleaning the query".into(),
      Self::NotFound => "No suitable image found from any provider".into(),
    }
  }
}

/// Thresholds and knobs for the waterfall, usually taken from [`SearchConfig`].
///
/// [`SearchConfig`]: crate::configuration::SearchConfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterfallSettings {
  /// Narrowest acceptable image
  pub min_width:          u32,
  /// Narrowest acceptable Wikimedia image for landmarks and covers
  pub cover_min_width:    u32,
  /// Hits requested per provider call
  pub page_size:          u32,
  /// Emergency modifier for visual topics, or when there is no topic
  pub emergency_modifier: String,
  /// Emergency modifier for every other topic
  pub fallback_modifier:  String,
  /// Whether share-alike licenses may be used on covers
  pub allow_share_alike:  bool,
}

impl Default for WaterfallSettings {
  fn default() -> Self { Self::from(&configuration::SearchConfig::default()) }
}

impl From<&configuration::SearchConfig> for WaterfallSettings {
  fn from(search: &configuration::SearchConfig) -> Self {
    Self {
      min_width:          search.single_min_width,
      cover_min_width:    search.cover_min_width,
      page_size:          search.single_page_size,
      emergency_modifier: search.emergency_modifier.clone(),
      fallback_modifier:  search.fallback_modifier.clone(),
      allow_share_alike:  search.allow_share_alike,
    }
  }
}

/// The sequential single-result resolver.
///
/// # Examples
///
/// ```no_run
/// use loompage::{ImageQuery, Orientation, Waterfall};
///
/// # async fn example(waterfall: Waterfall) {
/// let query = ImageQuery::new("Eiffel Tower at night").with_orientation(Orientation::Portrait);
/// if let Some(image) = waterfall.resolve(&query).await.into_candidate() {
///   println!("{} ({}x{})", image.url, image.width, image.height);
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct Waterfall {
  providers: Vec<Arc<dyn ImageProvider>>,
  settings:  WaterfallSettings,
}

impl std::fmt::Debug for Waterfall {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let kinds: Vec<_> = self.providers.iter().map(|p| p.kind()).collect();
    f.debug_struct("Waterfall")
      .field("providers", &kinds)
      .field("settings", &self.settings)
      .finish()
  }
}

impl Waterfall {
  /// Creates a waterfall over the given providers.
  ///
  /// Order does not matter: providers are arranged by [`ProviderPriority`] for every query.
  pub fn new(providers: Vec<Arc<dyn ImageProvider>>, settings: WaterfallSettings) -> Self {
    Self { providers, settings }
  }

  /// Builds every provider adapter from configuration and environment credentials.
  pub fn from_config(config: &Config) -> Result<Self> {
    let providers = provider::build_providers(config, &config.credentials())?;
    Ok(Self::new(providers, WaterfallSettings::from(&config.search)))
  }

  /// The configured providers.
  pub fn providers(&self) -> &[Arc<dyn ImageProvider>] { &self.providers }

  /// The active settings.
  pub fn settings(&self) -> &WaterfallSettings { &self.settings }

  /// Finds one image for `query`.
  ///
  /// Candidates whose normalized URL is in the query's exclusion set are never returned, nor
  /// are candidates narrower than the configured minimum width.
  pub async fn resolve(&self, query: &ImageQuery) -> Resolution {
    let Some(anchored) = query.prepared() else {
      info!("Query \"{}\" has no searchable terms left, skipping providers", query.raw());
      return Resolution::NoSuitableQuery;
    };

    let providers = self.ordered_providers(&anchored);
    let cover_rules = query.usage() == ImageUsage::Cover || is_landmark_query(&anchored);
    let relevance = significant_tokens(&anchored);
    let request = SearchRequest {
      orientation: query.orientation(),
      page_size: self.settings.page_size,
      page: 1,
      min_width: self.settings.min_width,
      mode: SearchMode::Single,
      usage: query.usage(),
      cover_rules,
      cover_min_width: self.settings.cover_min_width,
      allow_share_alike: self.settings.allow_share_alike,
      exclude: Some(query.excluded()),
      relevance: &relevance,
    };

    let mut attempts = vec![anchored.clone()];
    attempts.extend(generate_fallback_queries(&anchored));
    debug!("Resolving \"{anchored}\" with {} quer(ies) per provider", attempts.len());

    for provider in &providers {
      for attempt in &attempts {
        if let Some(candidate) = self.attempt(provider.as_ref(), attempt, &request).await {
          info!("Resolved \"{anchored}\" via {} using \"{attempt}\"", provider.kind());
          return Resolution::Found(candidate);
        }
      }
      debug!("{} exhausted for \"{anchored}\"", provider.kind());
    }

    if let Some(emergency) = self.emergency_query(query, &anchored) {
      if attempts.contains(&emergency) {
        debug!("Emergency query \"{emergency}\" was already tried");
      } else {
        debug!("Trying emergency query \"{emergency}\"");
        for provider in &providers {
          if let Some(candidate) = self.attempt(provider.as_ref(), &emergency, &request).await {
            info!(
              "Resolved \"{anchored}\" via {} using emergency \"{emergency}\"",
              provider.kind()
            );
            return Resolution::Found(candidate);
          }
        }
      }
    }

    info!("No image found for \"{anchored}\"");
    Resolution::NotFound
  }

  /// Available providers in priority order for this query.
  fn ordered_providers(&self, anchored: &str) -> Vec<Arc<dyn ImageProvider>> {
    ProviderPriority::for_query(anchored)
      .arrange(&self.providers)
      .into_iter()
      .filter(|provider| {
        let available = provider.is_available();
        if !available {
          debug!("{} is not configured, skipping", provider.kind());
        }
        available
      })
      .collect()
  }

  /// One provider call. Errors count as an empty result.
  async fn attempt(
    &self,
    provider: &dyn ImageProvider,
    query: &str,
    request: &SearchRequest<'_>,
  ) -> Option<ImageCandidate> {
    trace!("{}: searching \"{query}\"", provider.kind());
    match provider.search(query, request).await {
      Ok(found) =>
        found.into_iter().find(|candidate| self.accepts(provider.kind(), candidate, request)),
      Err(e) => {
        warn!("{} search for \"{query}\" failed: {e}", provider.kind());
        None
      },
    }
  }

  /// Re-checks the invariants every returned candidate must satisfy.
  fn accepts(
    &self,
    kind: ProviderKind,
    candidate: &ImageCandidate,
    request: &SearchRequest<'_>,
  ) -> bool {
    let min_width = if kind == ProviderKind::Wikimedia && request.cover_rules {
      request.min_width.max(request.cover_min_width)
    } else {
      request.min_width
    };
    candidate.width >= min_width
      && !request.exclude.is_some_and(|excluded| excluded.contains(&candidate.url))
  }

  /// The last-resort query: the topic's anchor (or the query's first significant token) plus a
  /// generic modifier.
  fn emergency_query(&self, query: &ImageQuery, anchored: &str) -> Option<String> {
    let anchor = query
      .topic()
      .and_then(anchor_token)
      .or_else(|| significant_tokens(anchored).into_iter().next())?;
    let modifier = match query.topic() {
      Some(topic) if !is_visual_topic(topic) => &self.settings.fallback_modifier,
      _ => &self.settings.emergency_modifier,
    };
    Some(format!("{anchor} {modifier}"))
  }
}
