use std::{
  collections::BTreeMap,
  error::Error,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;
use loompage::{
  prelude::*, provider::SearchRequest, ExclusionSet, Gallery, ImageCandidate, ImageQuery,
  ImageUsage, Orientation, ProviderKind, Resolution, Waterfall,
};
use tracing_test::traced_test;

mod gallery;
mod waterfall;

pub type TestResult<T> = std::result::Result<T, Box<dyn Error>>;

pub type CallLog = Arc<Mutex<Vec<(ProviderKind, String)>>>;

/// A provider double that answers from a fixed table, filtering the way real adapters do.
pub struct StubProvider {
  pub kind:    ProviderKind,
  pub answers: BTreeMap<String, Vec<ImageCandidate>>,
  pub calls:   CallLog,
}

impl StubProvider {
  pub fn new(kind: ProviderKind, calls: &CallLog) -> Self {
    Self { kind, answers: BTreeMap::new(), calls: calls.clone() }
  }

  /// Adds a hit of the given size for `query`.
  pub fn with_hit(mut self, query: &str, url: &str, width: u32, height: u32) -> Self {
    let hit = ImageCandidate::new(self.kind, url, width, height, Some("Stub"), "Stub License");
    self.answers.entry(query.to_string()).or_default().push(hit);
    self
  }

  pub fn shared(self) -> Arc<dyn ImageProvider> { Arc::new(self) }
}

#[async_trait]
impl ImageProvider for StubProvider {
  fn kind(&self) -> ProviderKind { self.kind }

  fn is_available(&self) -> bool { true }

  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>> {
    self.calls.lock().unwrap().push((self.kind, query.to_string()));
    let min_width = if self.kind == ProviderKind::Wikimedia && request.cover_rules {
      request.min_width.max(request.cover_min_width)
    } else {
      request.min_width
    };
    Ok(
      self
        .answers
        .get(query)
        .into_iter()
        .flatten()
        .filter(|hit| hit.width >= min_width)
        .filter(|hit| request.orientation.matches(hit.width, hit.height))
        .filter(|hit| !request.exclude.is_some_and(|excluded| excluded.contains(&hit.url)))
        .take(request.limit())
        .cloned()
        .collect(),
    )
  }
}

pub fn calls(log: &CallLog) -> Vec<(ProviderKind, String)> { log.lock().unwrap().clone() }

pub fn providers_called(log: &CallLog) -> Vec<ProviderKind> {
  let mut kinds: Vec<ProviderKind> = Vec::new();
  for (kind, _) in calls(log) {
    if kinds.last() != Some(&kind) {
      kinds.push(kind);
    }
  }
  kinds
}
