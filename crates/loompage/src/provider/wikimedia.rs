//! Wikimedia Commons search adapter.
//!
//! Commons needs no credential but asks every client to identify itself with a descriptive
//! `User-Agent`. Its search returns files of every kind (SVG diagrams, PDFs, audio), so hits
//! are restricted to bitmap photographs, and it has no orientation parameter.
//!
//! When a request carries cover rules (the query names a landmark, or the image is for a
//! cover) this adapter is stricter than the others:
//!
//! - the width floor rises to the cover minimum
//! - images of the wrong orientation are rejected
//! - for covers, share-alike and GFDL licensed files are rejected unless explicitly allowed

use super::*;

const API_URL: &str = "https://commons.wikimedia.org/w/api.php";
const FILE_NAMESPACE: &str = "6";
const THUMBNAIL_WIDTH: &str = "640";
const MAX_PAGE_SIZE: u32 = 50;
const BITMAP_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

lazy_static! {
  static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
  static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
  static ref SHARE_ALIKE: Regex =
    Regex::new(r"(?i)(\bsa\b|share[\s-]?alike|\bgfdl\b|\bgnu free documentation\b)").unwrap();
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  query: Option<QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
  #[serde(default)]
  pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
  #[serde(default)]
  index:     u32,
  #[serde(default)]
  imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
  url:            String,
  #[serde(default)]
  descriptionurl: Option<String>,
  #[serde(default)]
  thumburl:       Option<String>,
  width:          u32,
  height:         u32,
  #[serde(default)]
  mime:           Option<String>,
  #[serde(default)]
  extmetadata:    BTreeMap<String, MetadataValue>,
}

#[derive(Debug, Deserialize)]
struct MetadataValue {
  #[serde(default)]
  value: serde_json::Value,
}

impl ImageInfo {
  fn metadata(&self, key: &str) -> Option<String> {
    let value = self.extmetadata.get(key)?.value.as_str()?;
    let text = strip_html(value);
    (!text.is_empty()).then_some(text)
  }

  fn is_bitmap(&self) -> bool {
    self.mime.as_deref().is_some_and(|mime| BITMAP_MIME_TYPES.contains(&mime))
  }
}

/// Removes markup from an extmetadata field and collapses whitespace.
fn strip_html(value: &str) -> String {
  let text = HTML_TAG.replace_all(value, " ");
  WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Whether a license label requires derivatives to be shared alike.
fn is_share_alike(license: &str) -> bool { SHARE_ALIKE.is_match(license) }

/// Searches Wikimedia Commons.
#[derive(Debug, Clone)]
pub struct WikimediaProvider {
  client:     reqwest::Client,
  user_agent: String,
  enabled:    bool,
}

impl WikimediaProvider {
  /// Creates an enabled adapter identifying itself with `user_agent`.
  pub fn new(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
    Self { client, user_agent: user_agent.into(), enabled: true }
  }

  /// Enables or disables the adapter.
  pub fn with_enabled(self, enabled: bool) -> Self { Self { enabled, ..self } }

  fn request(&self, query: &str, request: &SearchRequest<'_>) -> reqwest::RequestBuilder {
    let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
    let offset = (request.page.max(1) - 1) * page_size;
    self.client.get(API_URL).header(reqwest::header::USER_AGENT, &self.user_agent).query(&[
      ("action", "query".to_string()),
      ("format", "json".to_string()),
      ("formatversion", "2".to_string()),
      ("generator", "search".to_string()),
      ("gsrsearch", format!("{query} filetype:bitmap")),
      ("gsrnamespace", FILE_NAMESPACE.to_string()),
      ("gsrlimit", page_size.to_string()),
      ("gsroffset", offset.to_string()),
      ("prop", "imageinfo".to_string()),
      ("iiprop", "url|size|mime|extmetadata".to_string()),
      ("iiurlwidth", THUMBNAIL_WIDTH.to_string()),
      ("iiextmetadatafilter", "Artist|LicenseShortName".to_string()),
    ])
  }
}

/// Maps a decoded response to accepted candidates.
///
/// The API returns pages keyed by id, so they are put back in search-rank order first.
fn candidates(response: SearchResponse, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
  let mut pages = response.query.map(|q| q.pages).unwrap_or_default();
  pages.sort_by_key(|page| page.index);

  let min_width = if request.cover_rules {
    request.min_width.max(request.cover_min_width)
  } else {
    request.min_width
  };
  let reject_share_alike = request.usage == ImageUsage::Cover && !request.allow_share_alike;

  let hits = pages
    .into_iter()
    .filter_map(|page| page.imageinfo.into_iter().next())
    .filter(|info| {
      if !info.is_bitmap() {
        trace!("wikimedia: skipping non-bitmap {} ({:?})", info.url, info.mime);
        return false;
      }
      if request.cover_rules && !request.orientation.matches(info.width, info.height) {
        trace!("wikimedia: skipping {} (not {})", info.url, request.orientation);
        return false;
      }
      true
    })
    .filter_map(|info| {
      let license = info.metadata("LicenseShortName").unwrap_or_else(|| "See source page".into());
      if reject_share_alike && is_share_alike(&license) {
        trace!("wikimedia: skipping {} ({license} on a cover)", info.url);
        return None;
      }
      let artist = info.metadata("Artist");
      Some(
        ImageCandidate::new(
          ProviderKind::Wikimedia,
          info.url,
          info.width,
          info.height,
          artist.as_deref(),
          license,
        )
        .with_thumbnail(info.thumburl)
        .with_source_page(info.descriptionurl),
      )
    });
  select(ProviderKind::Wikimedia, hits, request, min_width)
}

#[async_trait]
impl ImageProvider for WikimediaProvider {
  fn kind(&self) -> ProviderKind { ProviderKind::Wikimedia }

  fn is_available(&self) -> bool { self.enabled }

  async fn search(&self, query: &str, request: &SearchRequest<'_>) -> Result<Vec<ImageCandidate>> {
    if !self.enabled {
      debug!("wikimedia: disabled, skipping");
      return Ok(Vec::new());
    }
    let response: SearchResponse = fetch_json(self.kind(), self.request(query, request)).await?;
    Ok(candidates(response, request))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIXTURE: &str = r#"{
    "batchcomplete": true,
    "query": {
      "pages": [
        {
          "pageid": 300, "ns": 6, "title": "File:Tower portrait.jpg", "index": 3,
          "imageinfo": [{
            "url": "https://upload.wikimedia.org/c/tower-portrait.jpg",
            "descriptionurl": "https://commons.wikimedia.org/wiki/File:Tower_portrait.jpg",
            "width": 2400, "height": 3600, "mime": "image/jpeg",
            "extmetadata": { "LicenseShortName": { "value": "CC BY 4.0" } }
          }]
        },
        {
          "pageid": 100, "ns": 6, "title": "File:Tower diagram.svg", "index": 1,
          "imageinfo": [{
            "url": "https://upload.wikimedia.org/a/tower.svg",
            "width": 5000, "height": 3000, "mime": "image/svg+xml"
          }]
        },
        {
          "pageid": 200, "ns": 6, "title": "File:Tower dusk.jpg", "index": 2,
          "imageinfo": [{
            "url": "https://upload.wikimedia.org/b/tower-dusk.jpg",
            "descriptionurl": "https://commons.wikimedia.org/wiki/File:Tower_dusk.jpg",
            "thumburl": "https://upload.wikimedia.org/b/640px-tower-dusk.jpg",
            "width": 4000, "height": 2667, "mime": "image/jpeg",
            "extmetadata": {
              "Artist": {
                "value": "<a href=\"//commons.wikimedia.org/wiki/User:Pat\">Pat\n Rivers</a>"
              },
              "LicenseShortName": { "value": "CC BY-SA 4.0" }
            }
          }]
        },
        {
          "pageid": 400, "ns": 6, "title": "File:Tower small.png", "index": 4,
          "imageinfo": [{
            "url": "https://upload.wikimedia.org/d/tower-small.png",
            "width": 1700, "height": 1100, "mime": "image/png",
            "extmetadata": { "LicenseShortName": { "value": "Public domain" } }
          }]
        }
      ]
    }
  }"#;

  fn fixture() -> SearchResponse { serde_json::from_str(FIXTURE).unwrap() }

  fn urls(found: Vec<ImageCandidate>) -> Vec<String> { found.into_iter().map(|c| c.url).collect() }

  #[test]
  fn pages_are_ranked_by_index_and_vector_files_skipped() {
    let found = candidates(fixture(), &SearchRequest::gallery(1200, 20, 1));
    assert_eq!(urls(found), vec![
      "https://upload.wikimedia.org/b/tower-dusk.jpg",
      "https://upload.wikimedia.org/c/tower-portrait.jpg",
      "https://upload.wikimedia.org/d/tower-small.png",
    ]);
  }

  #[test]
  fn artist_markup_is_stripped() {
    let found = candidates(fixture(), &SearchRequest::single(1600));
    assert_eq!(found[0].attribution, "Photo by Pat Rivers via Wikimedia Commons");
    assert_eq!(found[0].license, "CC BY-SA 4.0");
    assert_eq!(
      found[0].source_page.as_deref(),
      Some("https://commons.wikimedia.org/wiki/File:Tower_dusk.jpg")
    );
  }

  #[test]
  fn cover_rules_raise_width_and_enforce_orientation() {
    let request = SearchRequest::gallery(1200, 20, 1).with_cover_rules(ImageUsage::Inline, true);
    let found = candidates(fixture(), &request);
    assert_eq!(urls(found.clone()), vec!["https://upload.wikimedia.org/b/tower-dusk.jpg"]);
    assert!(found.iter().all(|c| c.width >= 1800));
  }

  #[test]
  fn covers_reject_share_alike_unless_allowed() {
    let request = SearchRequest::single(1600)
      .with_orientation(Orientation::Portrait)
      .with_cover_rules(ImageUsage::Cover, true);
    assert_eq!(urls(candidates(fixture(), &request)), vec![
      "https://upload.wikimedia.org/c/tower-portrait.jpg"
    ]);

    let request = SearchRequest::single(1600).with_cover_rules(ImageUsage::Cover, true);
    assert!(candidates(fixture(), &request).is_empty());

    let request = SearchRequest { allow_share_alike: true, ..request };
    assert_eq!(urls(candidates(fixture(), &request)), vec![
      "https://upload.wikimedia.org/b/tower-dusk.jpg"
    ]);
  }

  #[test]
  fn share_alike_detection() {
    assert!(is_share_alike("CC BY-SA 4.0"));
    assert!(is_share_alike("cc-by-sa-3.0"));
    assert!(is_share_alike("GFDL"));
    assert!(!is_share_alike("CC BY 4.0"));
    assert!(!is_share_alike("Public domain"));
  }

  #[test]
  fn empty_search_has_no_query_block() {
    let response: SearchResponse = serde_json::from_str(r#"{"batchcomplete":true}"#).unwrap();
    assert!(candidates(response, &SearchRequest::single(1600)).is_empty());
  }

  #[test]
  fn request_identifies_client_and_pages() {
    let provider = WikimediaProvider::new(reqwest::Client::new(), "LoomTest/1.0 (ops@example.org)");
    let request = SearchRequest::gallery(1200, 10, 3);
    let built = provider.request("Eiffel Tower", &request).build().unwrap();
    let pairs: BTreeMap<_, _> = built.url().query_pairs().into_owned().collect();
    assert_eq!(built.headers()["user-agent"], "LoomTest/1.0 (ops@example.org)");
    assert_eq!(pairs["gsrsearch"], "Eiffel Tower filetype:bitmap");
    assert_eq!(pairs["gsrnamespace"], "6");
    assert_eq!(pairs["gsroffset"], "20");
    assert_eq!(pairs["iiurlwidth"], "640");
  }
}
