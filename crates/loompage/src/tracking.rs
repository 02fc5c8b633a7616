//! Post-selection download tracking.
//!
//! Unsplash's API guidelines require clients to hit a photo's `download_location` whenever the
//! photo is actually used. Selection must never wait on that call, so [`DownloadTracker`]
//! spawns it in the background and forgets about it. Failures are logged and not retried.

use tokio::task::JoinHandle;
use tracing::Instrument;

use super::*;

/// Fires tracking pings for selected images.
#[derive(Debug, Clone)]
pub struct DownloadTracker {
  client:     reqwest::Client,
  access_key: Option<String>,
}

impl DownloadTracker {
  /// Creates a tracker that authenticates with the Unsplash access key.
  pub fn new(client: reqwest::Client, access_key: Option<String>) -> Self {
    Self { client, access_key: access_key.filter(|k| !k.trim().is_empty()) }
  }

  /// Creates a tracker from configuration.
  pub fn from_config(config: &Config) -> Result<Self> {
    let credentials = config.credentials();
    Ok(Self::new(
      provider::http_client(config.search.request_timeout())?,
      credentials.get(ProviderKind::Unsplash).map(String::from),
    ))
  }

  /// Reports that `candidate` was used, if its provider asks for that.
  ///
  /// Returns immediately. The handle is only useful to tests that want to wait for the ping;
  /// dropping it does not cancel the request. `None` means nothing was sent: the candidate
  /// is not from Unsplash, carries no tracking URL, or no access key is configured.
  ///
  /// Must be called from within a Tokio runtime.
  pub fn track(&self, candidate: &ImageCandidate) -> Option<JoinHandle<()>> {
    if candidate.provider != ProviderKind::Unsplash {
      return None;
    }
    self.track_url(candidate.tracking_url.as_deref()?)
  }

  /// Pings a raw Unsplash `download_location`.
  pub fn track_url(&self, tracking_url: &str) -> Option<JoinHandle<()>> {
    let Some(access_key) = &self.access_key else {
      debug!("No Unsplash access key, not tracking {tracking_url}");
      return None;
    };
    let request = self
      .client
      .get(tracking_url)
      .header(reqwest::header::AUTHORIZATION, format!("Client-ID {access_key}"));
    let tracking_url = tracking_url.to_string();

    let ping = async move {
      match request.send().await {
        Ok(response) if response.status().is_success() => {
          debug!("Tracked download {tracking_url}");
        },
        Ok(response) => {
          warn!("Download tracking for {tracking_url} returned HTTP {}", response.status());
        },
        Err(e) => warn!("Download tracking for {tracking_url} failed: {e}"),
      }
    };
    Some(tokio::spawn(ping.in_current_span()))
  }
}
