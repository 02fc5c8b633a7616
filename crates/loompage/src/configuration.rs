//! TOML configuration and provider credentials.
//!
//! Configuration lives in a single TOML file (see [`Config::default_path`]). Every field has a
//! default, so a missing file or a file with only a few keys is fine. API keys may be written
//! to the file, but the environment always wins:
//!
//! | Provider | Environment variable  |
//! |----------|-----------------------|
//! | Unsplash | `UNSPLASH_ACCESS_KEY` |
//! | Pixabay  | `PIXABAY_API_KEY`     |
//! | Pexels   | `PEXELS_API_KEY`      |
//!
//! Wikimedia Commons needs no key.
//!
//! # Examples
//!
//! ```
//! use loompage::Config;
//!
//! let config = Config::from_toml_str(
//!   r#"
//!     [search]
//!     single_min_width = 2000
//!
//!     [providers.pexels]
//!     enabled = false
//!   "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.search.single_min_width, 2000);
//! assert_eq!(config.search.gallery_min_width, 1200);
//! assert!(!config.providers.pexels.enabled);
//! ```

use super::*;

/// Environment variable holding the Unsplash access key.
pub const UNSPLASH_ACCESS_KEY: &str = "UNSPLASH_ACCESS_KEY";
/// Environment variable holding the Pixabay API key.
pub const PIXABAY_API_KEY: &str = "PIXABAY_API_KEY";
/// Environment variable holding the Pexels API key.
pub const PEXELS_API_KEY: &str = "PEXELS_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Per-provider switches and keys
  pub providers: ProvidersConfig,
  /// Search thresholds and page sizes
  pub search:    SearchConfig,
  /// Gallery retry behaviour
  pub retry:     RetryConfig,
  /// HTTP service settings
  pub server:    ServerConfig,
}

/// Settings for every provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
  /// Unsplash
  pub unsplash:  KeyedProviderConfig,
  /// Pixabay
  pub pixabay:   KeyedProviderConfig,
  /// Pexels
  pub pexels:    KeyedProviderConfig,
  /// Wikimedia Commons
  pub wikimedia: WikimediaConfig,
}

/// Settings for a provider that needs an API key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyedProviderConfig {
  /// Whether the provider is queried at all
  pub enabled: bool,
  /// API key, overridden by the provider's environment variable
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
}

impl Default for KeyedProviderConfig {
  fn default() -> Self { Self { enabled: true, api_key: None } }
}

impl std::fmt::Debug for KeyedProviderConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("KeyedProviderConfig")
      .field("enabled", &self.enabled)
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}

/// Settings for Wikimedia Commons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikimediaConfig {
  /// Whether Commons is queried at all
  pub enabled:    bool,
  /// `User-Agent` sent with every Commons request, which Wikimedia asks to include contact
  /// details
  pub user_agent: String,
}

impl Default for WikimediaConfig {
  fn default() -> Self {
    Self {
      enabled:    true,
      user_agent: concat!(
        "LoomAndPage/",
        env!("CARGO_PKG_VERSION"),
        " (https://github.com/loom-and-page/loompage)"
      )
      .to_string(),
    }
  }
}

/// Search thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Narrowest image the single-result waterfall accepts
  pub single_min_width:     u32,
  /// Narrowest image the gallery accepts
  pub gallery_min_width:    u32,
  /// Narrowest Wikimedia image accepted for landmarks and covers
  pub cover_min_width:      u32,
  /// Per-request HTTP timeout
  pub request_timeout_secs: u64,
  /// Hits requested per call by the waterfall
  pub single_page_size:     u32,
  /// Hits requested per call by the gallery
  pub gallery_page_size:    u32,
  /// Word paired with the anchor for the last-resort search on visual topics
  pub emergency_modifier:   String,
  /// Word paired with the anchor for the last-resort search on other topics
  pub fallback_modifier:    String,
  /// Whether share-alike and GFDL licensed images may be used on covers
  pub allow_share_alike:    bool,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      single_min_width:     1600,
      gallery_min_width:    1200,
      cover_min_width:      1800,
      request_timeout_secs: 10,
      single_page_size:     10,
      gallery_page_size:    20,
      emergency_modifier:   "landscape".to_string(),
      fallback_modifier:    "scenery".to_string(),
      allow_share_alike:    false,
    }
  }
}

impl SearchConfig {
  /// The HTTP timeout as a [`Duration`].
  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }
}

/// Retry behaviour for transient gallery failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Total attempts per provider page, including the first
  pub max_attempts:  u32,
  /// Delay before the second attempt; doubles for each one after
  pub base_delay_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self { Self { max_attempts: 3, base_delay_ms: 250 } }
}

impl RetryConfig {
  /// Backoff before retry number `retry` (1 for the first retry).
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use loompage::configuration::RetryConfig;
  ///
  /// let retry = RetryConfig::default();
  /// assert_eq!(retry.delay_for(1), Duration::from_millis(250));
  /// assert_eq!(retry.delay_for(3), Duration::from_millis(1000));
  /// ```
  pub fn delay_for(&self, retry: u32) -> Duration {
    let factor = 2u64.saturating_pow(retry.saturating_sub(1));
    Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
  }
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Address the service listens on
  pub bind: String,
}

impl Default for ServerConfig {
  fn default() -> Self { Self { bind: "127.0.0.1:8787".to_string() } }
}

impl Config {
  /// Returns the default configuration file location.
  ///
  /// - On Unix: `~/.config/loompage/config.toml`
  /// - On macOS: `~/Library/Application Support/loompage/config.toml`
  /// - On Windows: `%APPDATA%\loompage\config.toml`
  /// - Fallback: `./loompage/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("loompage").join("config.toml")
  }

  /// Loads configuration from `path`, falling back to defaults when the file does not exist.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("No configuration at {}, using defaults", path.display());
      return Ok(Self::default());
    }
    debug!("Loading configuration from {}", path.display());
    Self::from_toml_str(&std::fs::read_to_string(path)?)
  }

  /// Parses and validates configuration from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: Self = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Writes the configuration to `path`, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Checks that the values make sense together.
  pub fn validate(&self) -> Result<()> {
    let search = &self.search;
    if search.single_min_width == 0 || search.gallery_min_width == 0 {
      return Err(LoompageError::Config("minimum widths must be positive".into()));
    }
    if search.single_page_size == 0 || search.gallery_page_size == 0 {
      return Err(LoompageError::Config("page sizes must be positive".into()));
    }
    if search.request_timeout_secs == 0 {
      return Err(LoompageError::Config("request_timeout_secs must be positive".into()));
    }
    if search.emergency_modifier.trim().is_empty() || search.fallback_modifier.trim().is_empty() {
      return Err(LoompageError::Config("emergency modifiers must not be empty".into()));
    }
    if self.retry.max_attempts == 0 {
      return Err(LoompageError::Config("retry.max_attempts must be at least 1".into()));
    }
    Ok(())
  }

  /// Resolves provider keys: environment variables first, then the file.
  pub fn credentials(&self) -> Credentials {
    Credentials::from_config(self).with_overrides(|name| std::env::var(name).ok())
  }
}

/// Resolved API keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
  unsplash: Option<String>,
  pixabay:  Option<String>,
  pexels:   Option<String>,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
    f.debug_struct("Credentials")
      .field("unsplash", &redact(&self.unsplash))
      .field("pixabay", &redact(&self.pixabay))
      .field("pexels", &redact(&self.pexels))
      .finish()
  }
}

impl Credentials {
  /// Keys written in the configuration file only.
  pub fn from_config(config: &Config) -> Self {
    let providers = &config.providers;
    Self {
      unsplash: providers.unsplash.api_key.clone(),
      pixabay:  providers.pixabay.api_key.clone(),
      pexels:   providers.pexels.api_key.clone(),
    }
    .normalized()
  }

  /// Replaces keys with values from `lookup`, called with each environment variable name.
  ///
  /// Blank values do not override.
  pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    let pick = |name: &str, current: Option<String>| {
      lookup(name).filter(|v| !v.trim().is_empty()).or(current)
    };
    Self {
      unsplash: pick(UNSPLASH_ACCESS_KEY, self.unsplash),
      pixabay:  pick(PIXABAY_API_KEY, self.pixabay),
      pexels:   pick(PEXELS_API_KEY, self.pexels),
    }
    .normalized()
  }

  /// Sets a key explicitly.
  pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
    let key = Some(key.into());
    match kind {
      ProviderKind::Unsplash => self.unsplash = key,
      ProviderKind::Pixabay => self.pixabay = key,
      ProviderKind::Pexels => self.pexels = key,
      ProviderKind::Wikimedia => {},
    }
    self.normalized()
  }

  /// The key for a provider, if it has one.
  pub fn get(&self, kind: ProviderKind) -> Option<&str> {
    match kind {
      ProviderKind::Unsplash => self.unsplash.as_deref(),
      ProviderKind::Pixabay => self.pixabay.as_deref(),
      ProviderKind::Pexels => self.pexels.as_deref(),
      ProviderKind::Wikimedia => None,
    }
  }

  fn normalized(self) -> Self {
    let clean = |key: Option<String>| {
      key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
    };
    Self {
      unsplash: clean(self.unsplash),
      pixabay:  clean(self.pixabay),
      pexels:   clean(self.pexels),
    }
  }
}
