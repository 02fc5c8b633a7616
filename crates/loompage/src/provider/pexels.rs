//! Pexels search adapter.

use super::*;

const API_URL: &str = "https://api.pexels.com/v1/search";
const MAX_PAGE_SIZE: u32 = 80;
const LICENSE: &str = "Pexels License";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
  width:        u32,
  height:       u32,
  #[serde(default)]
  url:          Option<String>,
  #[serde(default)]
  photographer: Option<String>,
  src:          Sources,
}

#[derive(Debug, Deserialize)]
struct Sources {
  #[serde(default)]
  original: Option<String>,
  #[serde(default)]
  large2x:  Option<String>,
  #[serde(default)]
  medium:   Option<String>,
}

impl Photo {
  fn into_candidate(self) -> Option<ImageCandidate> {
    let url = self.src.original.or(self.src.large2x)?;
    Some(
      ImageCandidate::new(
        ProviderKind::Pexels,
        url,
        self.width,
        self.height,
        self.photographer.as_deref(),
        LICENSE,
      )
      .with_thumbnail(self.src.medium)
      .with_source_page(self.url),
    )
  }
}

/// Searches `api.pexels.com`.
#[derive(Debug, Clone)]
pub struct PexelsProvider {
  client:  reqwest::Client,
  api_key: Option<String>,
}

impl PexelsProvider {
  /// Creates the adapter. Without an API key it never contacts the network.
  pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
    Self { client, api_key: api_key.filter(|k| !k.trim().is_empty()) }
  }

  fn request(
    &self,
    api_key: &str,
    query: &str,
    request: &SearchRequest<'_>,
  ) -> reqwest::RequestBuilder {
    self.client.get(API_URL).header(reqwest::header::AUTHORIZATION, api_key).query(&[
      ("query", query.to_string()),
      ("orientation", request.orientation.as_str().to_string()),
      ("per_page", request.page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
      ("page", request.page.max(1).to_string()),
    ])
  }
}

fn candidates(response: SearchResponse, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
  let hits = response.photos.into_iter().filter_map(Photo::into_candidate);
  select(ProviderKind::Pexels, hits, request, request.min_width)
}

#[async_trait]
impl ImageProvider for PexelsProvider {
  fn kind(&self) -> ProviderKind { ProviderKind::Pexels }

  fn is_available(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>> {
    let Some(api_key) = &self.api_key else {
      debug!("pexels: no API key configured, skipping");
      return Ok(Vec::new());
    };
    let response: SearchResponse =
      fetch_json(self.kind(), self.request(api_key, query, request)).await?;
    Ok(candidates(response, request))
  }
}
