//! Unsplash search adapter.
//!
//! Unsplash requires API clients to report when a photograph is actually used, so every
//! candidate carries the photo's `download_location` as its tracking URL. See
//! [`DownloadTracker`](crate::DownloadTracker).

use super::*;

const API_URL: &str = "https://api.unsplash.com/search/photos";
const MAX_PAGE_SIZE: u32 = 30;
const LICENSE: &str = "Unsplash License";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
  width:           u32,
  height:          u32,
  #[serde(default)]
  slug:            Option<String>,
  #[serde(default)]
  description:     Option<String>,
  #[serde(default)]
  alt_description: Option<String>,
  urls:            Urls,
  #[serde(default)]
  user:            Option<User>,
  #[serde(default)]
  links:           Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Urls {
  #[serde(default)]
  raw:   Option<String>,
  #[serde(default)]
  full:  Option<String>,
  #[serde(default)]
  small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
  #[serde(default)]
  name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Links {
  #[serde(default)]
  html:              Option<String>,
  #[serde(default)]
  download_location: Option<String>,
}

impl Photo {
  /// Free text describing the photo, lowercased.
  fn text(&self) -> String {
    [&self.alt_description, &self.description, &self.slug]
      .into_iter()
      .flatten()
      .map(|s| s.to_lowercase())
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Whether the description mentions at least one of the tokens.
  fn mentions_any(&self, tokens: &[String]) -> bool {
    let text = self.text();
    tokens.iter().any(|token| text.contains(token.as_str()))
  }

  fn into_candidate(self) -> Option<ImageCandidate> {
    let url = self.urls.full.or(self.urls.raw)?;
    let photographer = self.user.and_then(|u| u.name);
    let (html, download) = match self.links {
      Some(links) => (links.html, links.download_location),
      None => (None, None),
    };
    Some(
      ImageCandidate::new(
        ProviderKind::Unsplash,
        url,
        self.width,
        self.height,
        photographer.as_deref(),
        LICENSE,
      )
      .with_thumbnail(self.urls.small)
      .with_source_page(html)
      .with_tracking_url(download),
    )
  }
}

/// Searches `api.unsplash.com`.
#[derive(Debug, Clone)]
pub struct UnsplashProvider {
  client:     reqwest::Client,
  access_key: Option<String>,
}

impl UnsplashProvider {
  /// Creates the adapter. Without an access key it never contacts the network.
  pub fn new(client: reqwest::Client, access_key: Option<String>) -> Self {
    Self { client, access_key: access_key.filter(|k| !k.trim().is_empty()) }
  }

  fn request(
    &self,
    access_key: &str,
    query: &str,
    request: &SearchRequest<'_>,
  ) -> reqwest::RequestBuilder {
    self
      .client
      .get(API_URL)
      .header(reqwest::header::AUTHORIZATION, format!("Client-ID {access_key}"))
      .header("Accept-Version", "v1")
      .query(&[
        ("query", query.to_string()),
        ("orientation", request.orientation.as_str().to_string()),
        ("per_page", request.page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
        ("page", request.page.max(1).to_string()),
      ])
  }
}

/// Maps a decoded response to accepted candidates.
///
/// In gallery mode, when relevance tokens are supplied, a photo whose description mentions none
/// of them is skipped. Unsplash's ranking is loose enough that a search for "Kyoto temple"
/// otherwise returns generic temples from anywhere.
fn candidates(response: SearchResponse, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
  let check_relevance = request.mode == SearchMode::Gallery && !request.relevance.is_empty();
  let hits = response
    .results
    .into_iter()
    .filter(|photo| {
      let relevant = !check_relevance || photo.mentions_any(request.relevance);
      if !relevant {
        trace!("unsplash: skipping irrelevant photo {:?}", photo.slug);
      }
      relevant
    })
    .filter_map(Photo::into_candidate);
  select(ProviderKind::Unsplash, hits, request, request.min_width)
}

#[async_trait]
impl ImageProvider for UnsplashProvider {
  fn kind(&self) -> ProviderKind { ProviderKind::Unsplash }

  fn is_available(&self) -> bool { self.access_key.is_some() }

  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>> {
    let Some(access_key) = &self.access_key else {
      debug!("unsplash: no access key configured, skipping");
      return Ok(Vec::new());
    };
    let response: SearchResponse =
      fetch_json(self.kind(), self.request(access_key, query, request)).await?;
    Ok(candidates(response, request))
  }
}
