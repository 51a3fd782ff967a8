use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::content::ContentKind;

/// Prefix shared by every canonical feed path.
const FEEDS_PREFIX: &str = "/feeds/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteParseError {
    #[error("unknown feed variant `{0}` (expected all, blog, projects, changelog or activity)")]
    UnknownVariant(String),

    #[error("unknown feed format `{0}` (expected rss, atom or json)")]
    UnknownFormat(String),
}

/// Which subset of content a feed carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedVariant {
    /// Every content type.
    Unified,
    Blog,
    Projects,
    Changelog,
    /// Every content type, with a longer default item limit and shorter TTL.
    Activity,
}

impl FeedVariant {
    pub const ALL: [FeedVariant; 5] = [
        FeedVariant::Unified,
        FeedVariant::Blog,
        FeedVariant::Projects,
        FeedVariant::Changelog,
        FeedVariant::Activity,
    ];

    /// Path segment used in canonical routes.
    pub fn slug(self) -> &'static str {
        match self {
            FeedVariant::Unified => "all",
            FeedVariant::Blog => "blog",
            FeedVariant::Projects => "projects",
            FeedVariant::Changelog => "changelog",
            FeedVariant::Activity => "activity",
        }
    }

    /// Human-readable name, appended to the site title.
    pub fn label(self) -> &'static str {
        match self {
            FeedVariant::Unified => "All",
            FeedVariant::Blog => "Blog",
            FeedVariant::Projects => "Projects",
            FeedVariant::Changelog => "Changelog",
            FeedVariant::Activity => "Activity",
        }
    }

    pub fn includes(self, kind: ContentKind) -> bool {
        match self {
            FeedVariant::Unified | FeedVariant::Activity => true,
            FeedVariant::Blog => kind == ContentKind::Article,
            FeedVariant::Projects => kind == ContentKind::Project,
            FeedVariant::Changelog => kind == ContentKind::Changelog,
        }
    }

    /// Suggested cache lifetime for documents of this variant.
    pub fn ttl_seconds(self) -> u32 {
        match self {
            FeedVariant::Activity => 15 * 60,
            FeedVariant::Unified | FeedVariant::Blog | FeedVariant::Changelog => 60 * 60,
            FeedVariant::Projects => 24 * 60 * 60,
        }
    }

    /// Site page the feed's alternate link points at.
    pub fn home_path(self) -> &'static str {
        match self {
            FeedVariant::Unified | FeedVariant::Activity => "",
            FeedVariant::Blog => "blog",
            FeedVariant::Projects => "projects",
            FeedVariant::Changelog => "changelog",
        }
    }
}

impl fmt::Display for FeedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for FeedVariant {
    type Err = RouteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "unified" => Ok(FeedVariant::Unified),
            "blog" => Ok(FeedVariant::Blog),
            "projects" => Ok(FeedVariant::Projects),
            "changelog" => Ok(FeedVariant::Changelog),
            "activity" => Ok(FeedVariant::Activity),
            _ => Err(RouteParseError::UnknownVariant(s.to_string())),
        }
    }
}

/// Output syndication format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFormat {
    Rss,
    Atom,
    JsonFeed,
}

impl FeedFormat {
    pub const ALL: [FeedFormat; 3] = [FeedFormat::Rss, FeedFormat::Atom, FeedFormat::JsonFeed];

    pub fn extension(self) -> &'static str {
        match self {
            FeedFormat::Rss => "xml",
            FeedFormat::Atom => "atom",
            FeedFormat::JsonFeed => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FeedFormat::Rss => "application/rss+xml; charset=utf-8",
            FeedFormat::Atom => "application/atom+xml; charset=utf-8",
            FeedFormat::JsonFeed => "application/feed+json; charset=utf-8",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "atom",
            FeedFormat::JsonFeed => "json",
        })
    }
}

impl FromStr for FeedFormat {
    type Err = RouteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rss" | "xml" => Ok(FeedFormat::Rss),
            "atom" => Ok(FeedFormat::Atom),
            "json" | "jsonfeed" => Ok(FeedFormat::JsonFeed),
            _ => Err(RouteParseError::UnknownFormat(s.to_string())),
        }
    }
}

/// A canonical `(variant, format)` pair, served at `/feeds/{variant}.{ext}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedRoute {
    pub variant: FeedVariant,
    pub format: FeedFormat,
}

impl FeedRoute {
    pub fn new(variant: FeedVariant, format: FeedFormat) -> Self {
        Self { variant, format }
    }

    /// Every configured route, variants in declaration order.
    pub fn all() -> impl Iterator<Item = FeedRoute> {
        FeedVariant::ALL.into_iter().flat_map(|variant| {
            FeedFormat::ALL
                .into_iter()
                .map(move |format| FeedRoute::new(variant, format))
        })
    }

    /// Site-relative path, e.g. `/feeds/blog.atom`.
    pub fn path(&self) -> String {
        format!("{FEEDS_PREFIX}{}.{}", self.variant.slug(), self.format.extension())
    }

    /// Parses a canonical path. A single trailing slash is tolerated.
    ///
    /// ```
    /// use syndicate::feed::{FeedFormat, FeedRoute, FeedVariant};
    ///
    /// let route = FeedRoute::from_path("/feeds/projects.json").unwrap();
    /// assert_eq!(route, FeedRoute::new(FeedVariant::Projects, FeedFormat::JsonFeed));
    /// assert!(FeedRoute::from_path("/feeds/projects.html").is_none());
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let file = trim_trailing_slash(path).strip_prefix(FEEDS_PREFIX)?;
        let (slug, ext) = file.rsplit_once('.')?;
        // Only the canonical slugs, not the FromStr aliases
        let variant = FeedVariant::ALL.into_iter().find(|v| v.slug() == slug)?;
        let format = FeedFormat::from_extension(ext)?;
        Some(Self::new(variant, format))
    }
}

impl fmt::Display for FeedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Deprecated feed paths and the canonical path each one now lives at.
pub const LEGACY_PATHS: &[(&str, &str)] = &[
    ("/rss", "/feeds/all.xml"),
    ("/rss.xml", "/feeds/all.xml"),
    ("/feed", "/feeds/all.xml"),
    ("/feed.xml", "/feeds/all.xml"),
    ("/index.xml", "/feeds/all.xml"),
    ("/atom", "/feeds/all.atom"),
    ("/atom.xml", "/feeds/all.atom"),
    ("/feed.atom", "/feeds/all.atom"),
    ("/feed.json", "/feeds/all.json"),
    ("/blog/rss.xml", "/feeds/blog.xml"),
    ("/blog/feed.xml", "/feeds/blog.xml"),
    ("/blog/atom.xml", "/feeds/blog.atom"),
    ("/blog/feed.json", "/feeds/blog.json"),
    ("/projects/rss.xml", "/feeds/projects.xml"),
    ("/projects/atom.xml", "/feeds/projects.atom"),
    ("/projects/feed.json", "/feeds/projects.json"),
    ("/changelog/rss.xml", "/feeds/changelog.xml"),
    ("/changelog/atom.xml", "/feeds/changelog.atom"),
    ("/activity.xml", "/feeds/activity.xml"),
    ("/activity/rss.xml", "/feeds/activity.xml"),
];

/// Maps a deprecated feed path to its canonical replacement.
///
/// Exact, case-sensitive lookup; a single trailing slash on the request is
/// ignored. Unknown paths return `None`.
///
/// ```
/// use syndicate::feed::resolve_legacy;
///
/// assert_eq!(resolve_legacy("/rss.xml"), Some("/feeds/all.xml"));
/// assert_eq!(resolve_legacy("/blog/rss.xml/"), Some("/feeds/blog.xml"));
/// assert_eq!(resolve_legacy("/about"), None);
/// ```
pub fn resolve_legacy(path: &str) -> Option<&'static str> {
    let path = trim_trailing_slash(path);
    LEGACY_PATHS
        .iter()
        .find(|(legacy, _)| *legacy == path)
        .map(|(_, canonical)| *canonical)
}

fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}
