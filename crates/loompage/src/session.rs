//! One book-generation session.
//!
//! An [`ImageSession`] lives exactly as long as one book is being generated. It owns the
//! book's [`ExclusionSet`], so every image it hands out is distinct, and it takes care of the
//! post-selection obligations (download tracking) for whatever it selects.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use loompage::{Config, DownloadTracker, ImageSession, ImageUsage, Orientation, Waterfall};
//!
//! # async fn example() -> loompage::error::Result<()> {
//! let config = Config::load(Config::default_path())?;
//! let waterfall = Arc::new(Waterfall::from_config(&config)?);
//! let mut session = ImageSession::new(waterfall, "Hiking the Dolomites")
//!   .with_tracker(DownloadTracker::from_config(&config)?);
//!
//! let cover =
//!   session.resolve("Tre Cime at sunrise", Orientation::Portrait, ImageUsage::Cover).await;
//! for chapter in ["alpine hut", "via ferrata", "mountain lake"] {
//!   let image = session.resolve(chapter, Orientation::Landscape, ImageUsage::Inline).await;
//!   println!("{chapter}: {:?}", image.map(|i| i.url));
//! }
//! # Ok(())
//! # }
//! ```

use super::*;

/// Image selection state for one book.
#[derive(Debug)]
pub struct ImageSession {
  waterfall: Arc<Waterfall>,
  tracker:   Option<DownloadTracker>,
  topic:     Option<String>,
  excluded:  ExclusionSet,
}

impl ImageSession {
  /// Starts a session for a book about `topic`. A blank topic disables anchoring.
  pub fn new(waterfall: Arc<Waterfall>, topic: impl Into<String>) -> Self {
    let topic = topic.into();
    Self {
      waterfall,
      tracker: None,
      topic: (!topic.trim().is_empty()).then_some(topic),
      excluded: ExclusionSet::new(),
    }
  }

  /// Pings providers' download trackers for every image this session selects.
  pub fn with_tracker(self, tracker: DownloadTracker) -> Self {
    Self { tracker: Some(tracker), ..self }
  }

  /// The book topic.
  pub fn topic(&self) -> Option<&str> { self.topic.as_deref() }

  /// Whether the topic is photographic enough that every chapter should be illustrated.
  ///
  /// A keyword heuristic; books on other subjects typically only get a cover image.
  pub fn wants_chapter_images(&self) -> bool {
    self.topic.as_deref().is_some_and(query::is_visual_topic)
  }

  /// Marks a URL as used, for images placed by other means. Returns `true` if it was new.
  pub fn exclude(&mut self, url: &str) -> bool { self.excluded.insert(url) }

  /// URLs used so far in this book.
  pub fn exclusions(&self) -> &ExclusionSet { &self.excluded }

  /// Finds a fresh image for `text`, records it as used and fires download tracking.
  ///
  /// Never fails: `None` means the book goes on without this image.
  pub async fn resolve(
    &mut self,
    text: &str,
    orientation: Orientation,
    usage: ImageUsage,
  ) -> Option<ImageCandidate> {
    let mut query = ImageQuery::new(text)
      .with_orientation(orientation)
      .with_usage(usage)
      .with_excluded(self.excluded.clone());
    if let Some(topic) = &self.topic {
      query = query.with_topic(topic.as_str());
    }

    match self.waterfall.resolve(&query).await {
      Resolution::Found(candidate) => {
        self.excluded.insert(&candidate.url);
        if let Some(tracker) = &self.tracker {
          tracker.track(&candidate);
        }
        Some(candidate)
      },
      other => {
        info!("No image for \"{text}\": {}", other.message());
        None
      },
    }
  }

  /// Finds a landscape image for a chapter, if this book illustrates its chapters.
  pub async fn resolve_chapter(&mut self, text: &str) -> Option<ImageCandidate> {
    if !self.wants_chapter_images() {
      debug!("Topic {:?} is not visual, skipping chapter image for \"{text}\"", self.topic);
      return None;
    }
    self.resolve(text, Orientation::Landscape, ImageUsage::Inline).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Offers the same two photographs for every query.
  struct TwoPhotos;

  #[async_trait]
  impl ImageProvider for TwoPhotos {
    fn kind(&self) -> ProviderKind { ProviderKind::Pexels }

    fn is_available(&self) -> bool { true }

    async fn search(
      &self,
      _query: &str,
      request: &SearchRequest<'_>,
    ) -> Result<Vec<ImageCandidate>> {
      Ok(
        ["https://pe/one.jpg?w=1", "https://pe/two.jpg?w=1"]
          .into_iter()
          .filter(|url| !request.exclude.is_some_and(|ex| ex.contains(url)))
          .map(|url| {
            ImageCandidate::new(ProviderKind::Pexels, url, 3000, 2000, None, "Pexels License")
          })
          .take(1)
          .collect(),
      )
    }
  }

  fn session(topic: &str) -> ImageSession {
    let providers: Vec<Arc<dyn ImageProvider>> = vec![Arc::new(TwoPhotos)];
    ImageSession::new(Arc::new(Waterfall::new(providers, Default::default())), topic)
  }

  #[tokio::test]
  async fn images_are_never_reused_within_a_book() {
    let mut session = session("Hiking the Dolomites");
    let first = session.resolve("alpine hut", Orientation::Landscape, ImageUsage::Inline).await;
    let second = session.resolve("alpine hut", Orientation::Landscape, ImageUsage::Inline).await;
    let third = session.resolve("alpine hut", Orientation::Landscape, ImageUsage::Inline).await;

    assert_eq!(first.unwrap().url, "https://pe/one.jpg?w=1");
    assert_eq!(second.unwrap().url, "https://pe/two.jpg?w=1");
    assert!(third.is_none());
    assert_eq!(session.exclusions().len(), 2);
  }

  #[tokio::test]
  async fn seeded_exclusions_are_respected() {
    let mut session = session("Hiking the Dolomites");
    assert!(session.exclude("https://pe/one.jpg"));
    assert!(!session.exclude("https://PE/one.jpg?w=2"));
    let image = session.resolve("hut", Orientation::Landscape, ImageUsage::Inline).await;
    assert_eq!(image.unwrap().url, "https://pe/two.jpg?w=1");
  }

  #[tokio::test]
  async fn chapter_images_follow_the_topic() {
    let mut visual = session("Hiking the Dolomites");
    assert!(visual.wants_chapter_images());
    assert!(visual.resolve_chapter("ridge trail").await.is_some());

    let mut dry = session("Personal Finance for Freelancers");
    assert!(!dry.wants_chapter_images());
    assert!(dry.resolve_chapter("spreadsheet").await.is_none());
    assert!(dry.exclusions().is_empty());
  }

  #[tokio::test]
  async fn blank_topic_means_no_anchor() {
    let session = session("   ");
    assert_eq!(session.topic(), None);
    assert!(!session.wants_chapter_images());
  }
}
