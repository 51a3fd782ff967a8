use chrono::{DateTime, Utc};
use url::Url;

use super::routes::{FeedRoute, FeedVariant};
use crate::config::{AuthorConfig, ConfigError, SiteConfig};
use crate::util::LinkError;

/// Author attached to feeds and items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAuthor {
    pub name: String,
    pub email: Option<String>,
    pub uri: Option<String>,
}

impl FeedAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            uri: None,
        }
    }

    pub fn from_config(config: &AuthorConfig) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            name: config.name.trim().to_string(),
            email: non_empty(&config.email),
            uri: non_empty(&config.url),
        }
    }
}

/// Image enclosure of a feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImage {
    /// Absolute URL.
    pub url: String,
    pub mime_type: &'static str,
    /// Size in bytes, if known.
    pub length: Option<u64>,
}

/// Item categories: trimmed, empty tags dropped, first occurrence wins.
///
/// ```
/// use syndicate::feed::Categories;
///
/// let categories: Categories = ["a", "a", " b ", ""].into_iter().collect();
/// assert_eq!(categories.as_slice(), ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories(Vec<String>);

impl Categories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tag` unless it is blank or already present. Returns whether it
    /// was added.
    pub fn push(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.0.iter().any(|existing| existing == tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Categories {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut categories = Categories::new();
        for tag in iter {
            categories.push(tag.as_ref());
        }
        categories
    }
}

impl<'a> IntoIterator for &'a Categories {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The canonical item every encoder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Canonical absolute URL. Stable across regenerations.
    pub id: String,
    pub title: String,
    /// Plain text.
    pub summary: String,
    /// Sanitized HTML. Empty when the body could not be rendered.
    pub content_html: String,
    pub link: String,
    pub published: DateTime<Utc>,
    /// Never earlier than `published`.
    pub updated: DateTime<Utc>,
    pub categories: Categories,
    pub author: FeedAuthor,
    pub image: Option<FeedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub version: String,
    pub uri: Option<String>,
}

/// Channel-level metadata for one `(variant, format)` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    /// Site page the feed represents.
    pub site_link: String,
    /// Absolute URL the document itself is served from.
    pub feed_self_link: String,
    pub language: String,
    pub author: FeedAuthor,
    pub generator: Generator,
    /// Suggested refresh interval, for RSS `<ttl>`.
    pub ttl_minutes: u32,
    /// When the document was assembled. Used as the feed's own timestamp
    /// when it has no items.
    pub build_date: DateTime<Utc>,
}

impl FeedConfig {
    /// Builds the config for `route` from validated site settings.
    ///
    /// `base` is the site URL returned by [`SiteConfig::validate`].
    pub fn for_route(
        site: &SiteConfig,
        base: &Url,
        route: FeedRoute,
        build_date: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let join = |path: &str| {
            base.join(path)
                .map(String::from)
                .map_err(|e| ConfigError::InvalidUrl {
                    field: "site_url",
                    source: LinkError::InvalidUrl(e),
                })
        };

        let site_title = site.title.trim();
        let title = match route.variant {
            FeedVariant::Unified => site_title.to_string(),
            variant => format!("{site_title} - {}", variant.label()),
        };
        let description = match site.description.trim() {
            "" => title.clone(),
            description => description.to_string(),
        };

        Ok(Self {
            description,
            site_link: join(route.variant.home_path())?,
            feed_self_link: join(route.path().trim_start_matches('/'))?,
            language: site.language.trim().to_string(),
            author: FeedAuthor::from_config(&site.author),
            generator: Generator {
                name: site.generator.name.clone(),
                version: site.generator.version.clone(),
                uri: site.generator.uri.clone(),
            },
            ttl_minutes: route.variant.ttl_seconds() / 60,
            build_date,
            title,
        })
    }
}
