//! Site configuration parser for `syndicate.toml`.
//!
//! The config file is optional on disk: a missing or empty file yields
//! `SiteConfig::default()`. Defaults do not name a site, so validation (run
//! when an [`Assembler`](crate::feed::Assembler) is built) rejects them with a
//! typed [`ConfigError::MissingField`] before any feed work starts.
//! Unknown keys are accepted by serde but logged as likely typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::feed::FeedVariant;
use crate::util::{parse_site_url, LinkError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A field every feed needs is empty.
    #[error("Missing required config field `{0}`")]
    MissingField(&'static str),

    /// A URL field is not an absolute http(s) URL.
    #[error("Invalid URL in config field `{field}`: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: LinkError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Site-wide settings shared by every feed variant.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name, used as the base of every feed title.
    pub title: String,

    /// Channel/feed description.
    pub description: String,

    /// Absolute base URL of the site (`https://example.com`).
    pub site_url: String,

    /// Language tag for the feeds (`en`, `en-GB`).
    pub language: String,

    /// Author attached to every item. Constant per site.
    pub author: AuthorConfig,

    /// Maximum number of items per feed variant.
    pub limits: FeedLimits,

    /// Generator metadata written into RSS and Atom documents.
    pub generator: GeneratorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            site_url: String::new(),
            language: "en".to_string(),
            author: AuthorConfig::default(),
            limits: FeedLimits::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
}

/// Per-variant item limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedLimits {
    pub unified: u32,
    pub blog: u32,
    pub projects: u32,
    pub changelog: u32,
    pub activity: u32,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            unified: 20,
            blog: 20,
            projects: 20,
            changelog: 20,
            activity: 50,
        }
    }
}

impl FeedLimits {
    pub fn for_variant(&self, variant: FeedVariant) -> u32 {
        match variant {
            FeedVariant::Unified => self.unified,
            FeedVariant::Blog => self.blog,
            FeedVariant::Projects => self.projects,
            FeedVariant::Changelog => self.changelog,
            FeedVariant::Activity => self.activity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub name: String,
    pub version: String,
    pub uri: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uri: None,
        }
    }
}

impl SiteConfig {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "title",
        "description",
        "site_url",
        "language",
        "author",
        "limits",
        "generator",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(SiteConfig::default())`
    /// - Empty file → `Ok(SiteConfig::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid slurping a corrupted file
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: SiteConfig = toml::from_str(content)?;
        tracing::info!(site = %config.site_url, title = %config.title, "Loaded site configuration");
        Ok(config)
    }

    /// Checks every field a feed requires and returns the parsed base URL.
    ///
    /// The base URL always ends with `/`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] for an empty `title`, `site_url`,
    ///   `language` or `author.name`
    /// - [`ConfigError::InvalidUrl`] if `site_url` or `author.url` is not an
    ///   absolute http(s) URL
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::MissingField("title"));
        }
        if self.site_url.trim().is_empty() {
            return Err(ConfigError::MissingField("site_url"));
        }
        if self.language.trim().is_empty() {
            return Err(ConfigError::MissingField("language"));
        }
        if self.author.name.trim().is_empty() {
            return Err(ConfigError::MissingField("author.name"));
        }
        if let Some(url) = &self.author.url {
            parse_site_url(url).map_err(|source| ConfigError::InvalidUrl {
                field: "author.url",
                source,
            })?;
        }

        parse_site_url(&self.site_url).map_err(|source| ConfigError::InvalidUrl {
            field: "site_url",
            source,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
