//! Request handlers.
//!
//! A search without `limit` is an automatic selection: the chosen image is final, so its
//! download tracking fires here. Gallery results are only candidates; callers report the one
//! they pick through `/api/images/track-download`.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::*;

/// Largest gallery a single request may ask for.
pub const MAX_GALLERY_LIMIT: usize = 100;

/// Prefix every accepted tracking URL must have.
const UNSPLASH_TRACKING_PREFIX: &str = "https://api.unsplash.com/";

/// Error reply, `{ "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  /// What was wrong with the request
  pub error: String,
}

/// Handler result with a status and JSON error on failure.
pub type ApiResult<T> = std::result::Result<T, (StatusCode, Json<ErrorResponse>)>;

/// A 400 reply.
fn bad_request(message: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
  (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message.to_string() }))
}

// ── Health & providers ────────────────────────────────────────────

/// Reply to `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
  /// Always `ok`
  pub status:  &'static str,
  /// Crate version
  pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
  Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// One entry of `GET /api/providers`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
  /// Identifier, as used in `source`
  pub id:        ProviderKind,
  /// Human-facing name
  pub name:      &'static str,
  /// Whether the provider has credentials and is enabled
  pub available: bool,
}

/// `GET /api/providers`, in default priority order.
pub async fn providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderStatus>> {
  let arranged = ProviderPriority::default().arrange(state.waterfall.providers());
  Json(
    arranged
      .iter()
      .map(|provider| ProviderStatus {
        id:        provider.kind(),
        name:      provider.kind().display_name(),
        available: provider.is_available(),
      })
      .collect(),
  )
}

// ── Search ────────────────────────────────────────────────────────

/// Body of `POST /api/images/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
  /// What the image should show
  #[serde(default)]
  pub query:        String,
  /// `landscape` (default) or `portrait`
  #[serde(default)]
  pub orientation:  Option<String>,
  /// Images already used in the book
  #[serde(default)]
  pub exclude_urls: Option<Vec<String>>,
  /// Book subject, used to anchor the query
  #[serde(default)]
  pub book_topic:   Option<String>,
  /// Present for gallery mode
  #[serde(default)]
  pub limit:        Option<usize>,
  /// `inline` (default) or `cover`
  #[serde(default)]
  pub usage:        Option<ImageUsage>,
}

impl SearchBody {
  /// Validates the body and builds the library query.
  fn to_query(&self) -> std::result::Result<ImageQuery, LoompageError> {
    loompage::query::validate_raw_query(&self.query)?;
    let orientation = match self.orientation.as_deref() {
      Some(orientation) => orientation.parse()?,
      None => Orientation::default(),
    };
    if let Some(limit) = self.limit {
      if !(1..=MAX_GALLERY_LIMIT).contains(&limit) {
        return Err(LoompageError::InvalidQuery(format!(
          "limit must be between 1 and {MAX_GALLERY_LIMIT}, got {limit}"
        )));
      }
    }

    let mut query = ImageQuery::new(self.query.as_str())
      .with_orientation(orientation)
      .with_usage(self.usage.unwrap_or_default())
      .with_excluded(ExclusionSet::from_urls(self.exclude_urls.iter().flatten()));
    if let Some(topic) = &self.book_topic {
      query = query.with_topic(topic.as_str());
    }
    Ok(query)
  }
}

/// Single-result reply. When nothing was found only `imageUrl` (null), `attribution` (empty),
/// `source` (`none`) and `message` are present.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
  /// Full-resolution URL
  pub image_url:      Option<String>,
  /// Preview URL
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thumbnail_url:  Option<String>,
  /// Credit line
  pub attribution:    String,
  /// Provider identifier, or `none`
  pub source:         String,
  /// Pixel width
  #[serde(skip_serializing_if = "Option::is_none")]
  pub width:          Option<u32>,
  /// Pixel height
  #[serde(skip_serializing_if = "Option::is_none")]
  pub height:         Option<u32>,
  /// Whether the image is wide enough for print
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_print_ready: Option<bool>,
  /// License label
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license:        Option<String>,
  /// Human-facing page for the photograph
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_page:    Option<String>,
  /// Why nothing was returned
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:        Option<String>,
}

impl From<Resolution> for ImageResponse {
  fn from(resolution: Resolution) -> Self {
    match resolution {
      Resolution::Found(candidate) => Self {
        image_url:      Some(candidate.url),
        thumbnail_url:  candidate.thumbnail,
        attribution:    candidate.attribution,
        source:         candidate.provider.to_string(),
        width:          Some(candidate.width),
        height:         Some(candidate.height),
        is_print_ready: Some(candidate.print_ready),
        license:        Some(candidate.license),
        source_page:    candidate.source_page,
        message:        None,
      },
      other => Self {
        source: "none".to_string(),
        message: Some(other.message()),
        ..Self::default()
      },
    }
  }
}

/// Reply of `POST /api/images/search`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
  /// Without `limit`
  Single(ImageResponse),
  /// With `limit`
  Gallery(GalleryResult),
}

/// `POST /api/images/search`
pub async fn search(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SearchBody>,
) -> ApiResult<Json<SearchResponse>> {
  let query = body.to_query().map_err(bad_request)?;

  if let Some(limit) = body.limit {
    info!("Gallery request for \"{}\" (limit {limit})", body.query);
    return Ok(Json(SearchResponse::Gallery(state.gallery.search(&query, limit).await)));
  }

  info!("Image request for \"{}\"", body.query);
  let resolution = state.waterfall.resolve(&query).await;
  if let Resolution::Found(candidate) = &resolution {
    state.tracker.track(candidate);
  }
  Ok(Json(SearchResponse::Single(ImageResponse::from(resolution))))
}

// ── Download tracking ─────────────────────────────────────────────

/// Body of `POST /api/images/track-download`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackBody {
  /// The `trackingUrl` of the chosen gallery image
  pub download_location: String,
}

/// Reply of `POST /api/images/track-download`.
#[derive(Debug, Serialize)]
pub struct TrackResponse {
  /// Whether a ping was sent; `false` when no Unsplash key is configured
  pub tracked: bool,
}

/// `POST /api/images/track-download`. Answers 202 before the ping completes.
pub async fn track_download(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TrackBody>,
) -> ApiResult<(StatusCode, Json<TrackResponse>)> {
  if !body.download_location.starts_with(UNSPLASH_TRACKING_PREFIX) {
    return Err(bad_request(format!(
      "downloadLocation must start with {UNSPLASH_TRACKING_PREFIX}"
    )));
  }
  let tracked = state.tracker.track_url(&body.download_location).is_some();
  debug!("Download tracking requested for {} (sent: {tracked})", body.download_location);
  Ok((StatusCode::ACCEPTED, Json(TrackResponse { tracked })))
}
