//! HTTP API for the book-generation pipeline.
//!
//! | Method | Path                         | Purpose                                   |
//! |--------|------------------------------|-------------------------------------------|
//! | GET    | `/health`                    | Liveness and version                      |
//! | GET    | `/api/providers`             | Provider availability in priority order   |
//! | POST   | `/api/images/search`         | Single image, or a gallery with `limit`   |
//! | POST   | `/api/images/track-download` | Report use of a gallery pick to Unsplash  |
//!
//! Handlers never fail because nothing was found; only malformed requests get a 400. When a
//! client disconnects mid-search the handler future is dropped, which drops every in-flight
//! provider request with it.

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::cors::CorsLayer;

use super::*;

pub mod handlers;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
  /// Single-result resolver
  pub waterfall: Waterfall,
  /// Multi-result aggregator over the same providers
  pub gallery:   Gallery,
  /// Post-selection download tracking
  pub tracker:   DownloadTracker,
}

impl AppState {
  /// Builds every provider once and shares them between the waterfall and the gallery.
  pub fn from_config(config: &Config) -> Result<Self> {
    let waterfall = Waterfall::from_config(config)?;
    let gallery = Gallery::new(waterfall.providers().to_vec())
      .with_settings(&config.search, &config.retry);
    Ok(Self { waterfall, gallery, tracker: DownloadTracker::from_config(config)? })
  }
}

/// Build the complete application router.
pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/providers", get(handlers::providers))
    .route("/api/images/search", post(handlers::search))
    .route("/api/images/track-download", post(handlers::track_download))
    .layer(CorsLayer::permissive())
    .with_state(state)
}
