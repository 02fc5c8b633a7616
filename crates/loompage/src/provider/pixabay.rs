//! Pixabay search adapter.

use super::*;

const API_URL: &str = "https://pixabay.com/api/";
const MIN_PAGE_SIZE: u32 = 3;
const MAX_PAGE_SIZE: u32 = 200;
const LICENSE: &str = "Pixabay Content License";
/// Longest edge of the `fullHDURL` rendition.
const FULL_HD_EDGE: u32 = 1920;
/// Longest edge of the `largeImageURL` rendition.
const LARGE_IMAGE_EDGE: u32 = 1280;

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hit {
  image_width:     u32,
  image_height:    u32,
  #[serde(default, rename = "pageURL")]
  page_url:        Option<String>,
  #[serde(default, rename = "webformatURL")]
  webformat_url:   Option<String>,
  #[serde(default, rename = "largeImageURL")]
  large_image_url: Option<String>,
  #[serde(default, rename = "fullHDURL")]
  full_hd_url:     Option<String>,
  #[serde(default, rename = "imageURL")]
  image_url:       Option<String>,
  #[serde(default)]
  user:            Option<String>,
}

/// Dimensions of a rendition whose longest edge is capped at `edge`.
fn scaled_to(width: u32, height: u32, edge: u32) -> (u32, u32) {
  let longest = width.max(height);
  if longest <= edge {
    return (width, height);
  }
  let scale = |side: u32| (u64::from(side) * u64::from(edge) / u64::from(longest)) as u32;
  (scale(width), scale(height))
}

impl Hit {
  /// Prefers the original upload when the key grants it, then Full HD, then the 1280px
  /// rendition. Width and height describe whichever URL is returned.
  fn into_candidate(self) -> Option<ImageCandidate> {
    let (width, height) = (self.image_width, self.image_height);
    let (url, (width, height)) = match (self.image_url, self.full_hd_url, self.large_image_url) {
      (Some(url), ..) => (url, (width, height)),
      (None, Some(url), _) => (url, scaled_to(width, height, FULL_HD_EDGE)),
      (None, None, Some(url)) => (url, scaled_to(width, height, LARGE_IMAGE_EDGE)),
      (None, None, None) => return None,
    };
    Some(
      ImageCandidate::new(ProviderKind::Pixabay, url, width, height, self.user.as_deref(), LICENSE)
        .with_thumbnail(self.webformat_url)
        .with_source_page(self.page_url),
    )
  }
}

/// Searches `pixabay.com/api`.
#[derive(Debug, Clone)]
pub struct PixabayProvider {
  client:  reqwest::Client,
  api_key: Option<String>,
}

impl PixabayProvider {
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
    let orientation = match request.orientation {
      Orientation::Landscape => "horizontal",
      Orientation::Portrait => "vertical",
    };
    self.client.get(API_URL).query(&[
      ("key", api_key.to_string()),
      ("q", query.to_string()),
      ("image_type", "photo".to_string()),
      ("orientation", orientation.to_string()),
      ("per_page", request.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string()),
      ("page", request.page.max(1).to_string()),
      ("safesearch", "true".to_string()),
    ])
  }
}

fn candidates(response: SearchResponse, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
  let hits = response.hits.into_iter().filter_map(Hit::into_candidate);
  select(ProviderKind::Pixabay, hits, request, request.min_width)
}

#[async_trait]
impl ImageProvider for PixabayProvider {
  fn kind(&self) -> ProviderKind { ProviderKind::Pixabay }

  fn is_available(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>> {
    let Some(api_key) = &self.api_key else {
      debug!("pixabay: no API key configured, skipping");
      return Ok(Vec::new());
    };
    let response: SearchResponse =
      fetch_json(self.kind(), self.request(api_key, query, request)).await?;
    Ok(candidates(response, request))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIXTURE: &str = r#"{
    "total": 2,
    "totalHits": 2,
    "hits": [
      {
        "id": 1,
        "pageURL": "https://pixabay.com/photos/lake-1/",
        "tags": "lake, mountains",
        "webformatURL": "https://pixabay.com/get/lake-1_640.jpg",
        "largeImageURL": "https://pixabay.com/get/lake-1_1280.jpg",
        "imageWidth": 1500,
        "imageHeight": 1000,
        "user": "hiker"
      },
      {
        "id": 2,
        "pageURL": "https://pixabay.com/photos/lake-2/",
        "webformatURL": "https://pixabay.com/get/lake-2_640.jpg",
        "largeImageURL": "https://pixabay.com/get/lake-2_1280.jpg",
        "fullHDURL": "https://pixabay.com/get/lake-2_1920.jpg",
        "imageWidth": 4000,
        "imageHeight": 2667,
        "user": "paddler"
      }
    ]
  }"#;

  #[test]
  fn maps_hits_and_applies_width_threshold() {
    let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
    let found = candidates(response, &SearchRequest::single(1600));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].url, "https://pixabay.com/get/lake-2_1920.jpg");
    assert_eq!(found[0].thumbnail.as_deref(), Some("https://pixabay.com/get/lake-2_640.jpg"));
    assert_eq!(found[0].source_page.as_deref(), Some("https://pixabay.com/photos/lake-2/"));
    assert_eq!(found[0].attribution, "Photo by paddler via Pixabay");
    assert_eq!(found[0].license, "Pixabay Content License");
    assert_eq!((found[0].width, found[0].height), (1920, 1280));
    assert!(found[0].print_ready);
  }

  #[test]
  fn gallery_threshold_is_lower() {
    let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
    let found = candidates(response, &SearchRequest::gallery(1200, 20, 1));
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].url, "https://pixabay.com/get/lake-1_1280.jpg");
    assert_eq!((found[0].width, found[0].height), (1280, 853));
    assert!(!found[0].print_ready);
  }

  #[test]
  fn large_rendition_width_is_what_gets_judged() {
    let response: SearchResponse = serde_json::from_str(
      r#"{ "hits": [{
        "largeImageURL": "https://pixabay.com/get/x_1280.jpg",
        "imageWidth": 6000,
        "imageHeight": 4000
      }] }"#,
    )
    .unwrap();
    assert!(candidates(response, &SearchRequest::single(1600)).is_empty());

    let response: SearchResponse = serde_json::from_str(
      r#"{ "hits": [{
        "imageURL": "https://pixabay.com/get/x_original.jpg",
        "largeImageURL": "https://pixabay.com/get/x_1280.jpg",
        "imageWidth": 6000,
        "imageHeight": 4000
      }] }"#,
    )
    .unwrap();
    let found = candidates(response, &SearchRequest::single(1600));
    assert_eq!(found[0].url, "https://pixabay.com/get/x_original.jpg");
    assert_eq!(found[0].width, 6000);
  }

  #[test]
  fn portrait_renditions_cap_the_long_edge() {
    assert_eq!(scaled_to(3000, 4500, LARGE_IMAGE_EDGE), (853, 1280));
    assert_eq!(scaled_to(1000, 800, LARGE_IMAGE_EDGE), (1000, 800));
    assert_eq!(scaled_to(0, 0, FULL_HD_EDGE), (0, 0));
  }

  #[test]
  fn request_maps_orientation_and_clamps_page_size() {
    let provider = PixabayProvider::new(reqwest::Client::new(), Some("px".into()));
    let request = SearchRequest::single(1600).with_orientation(Orientation::Portrait);
    let built = provider.request("px", "alpine lake", &request).build().unwrap();
    let pairs: BTreeMap<_, _> = built.url().query_pairs().into_owned().collect();
    assert_eq!(pairs["key"], "px");
    assert_eq!(pairs["q"], "alpine lake");
    assert_eq!(pairs["orientation"], "vertical");
    assert_eq!(pairs["image_type"], "photo");

    let tiny = SearchRequest::gallery(1200, 1, 1);
    let built = provider.request("px", "lake", &tiny).build().unwrap();
    let pairs: BTreeMap<_, _> = built.url().query_pairs().into_owned().collect();
    assert_eq!(pairs["per_page"], "3");
  }

  #[tokio::test]
  async fn missing_key_returns_nothing() {
    let provider = PixabayProvider::new(reqwest::Client::new(), None);
    assert!(!provider.is_available());
    assert!(provider.search("lake", &SearchRequest::single(1600)).await.unwrap().is_empty());
  }
}
