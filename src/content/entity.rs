use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The kind of a [`ContentEntity`], used for variant filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Article,
    Project,
    Changelog,
}

/// One piece of authored content, as supplied by the content-loading layer.
///
/// Closed sum type: every consumer matches exhaustively, so adding a content
/// type is a compile error everywhere it is not yet handled.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEntity {
    Article(Article),
    Project(Project),
    Changelog(ChangelogEntry),
}

/// Image attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Absolute or site-relative URL.
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    /// Size in bytes, when the content layer knows it.
    #[serde(default)]
    pub length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw markdown.
    #[serde(default)]
    pub body: String,
    #[serde(deserialize_with = "flexible_date::deserialize")]
    pub published_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "flexible_date::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Article {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            body: String::new(),
            published_at,
            updated_at: None,
            tags: Vec::new(),
            image: None,
            draft: false,
            hidden: false,
        }
    }
}

/// An outbound link listed on a project page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectLink {
    pub label: String,
    pub url: String,
}

/// A portfolio project. Projects carry no timestamp of their own; the feed
/// date is inferred from `timeline`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProjectLink>,
    /// Freeform, e.g. `"2022 → Present"`.
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Project {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            highlights: Vec::new(),
            tech_stack: Vec::new(),
            links: Vec::new(),
            timeline: None,
            tags: Vec::new(),
            image: None,
            draft: false,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntry {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Raw markdown.
    #[serde(default)]
    pub body: String,
    #[serde(deserialize_with = "flexible_date::deserialize")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl ChangelogEntry {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            summary: String::new(),
            body: String::new(),
            date,
            tags: Vec::new(),
            image: None,
            draft: false,
            hidden: false,
        }
    }
}

impl ContentEntity {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentEntity::Article(_) => ContentKind::Article,
            ContentEntity::Project(_) => ContentKind::Project,
            ContentEntity::Changelog(_) => ContentKind::Changelog,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            ContentEntity::Article(a) => &a.slug,
            ContentEntity::Project(p) => &p.slug,
            ContentEntity::Changelog(c) => &c.slug,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentEntity::Article(a) => &a.title,
            ContentEntity::Project(p) => &p.title,
            ContentEntity::Changelog(c) => &c.title,
        }
    }

    /// Plain-text description used as the item summary.
    pub fn summary(&self) -> &str {
        match self {
            ContentEntity::Article(a) => &a.description,
            ContentEntity::Project(p) => &p.description,
            ContentEntity::Changelog(c) => &c.summary,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            ContentEntity::Article(a) => &a.tags,
            ContentEntity::Project(p) => &p.tags,
            ContentEntity::Changelog(c) => &c.tags,
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            ContentEntity::Article(a) => a.image.as_ref(),
            ContentEntity::Project(p) => p.image.as_ref(),
            ContentEntity::Changelog(c) => c.image.as_ref(),
        }
    }

    /// False for drafts and hidden entries; those never reach a feed.
    pub fn is_visible(&self) -> bool {
        let (draft, hidden) = match self {
            ContentEntity::Article(a) => (a.draft, a.hidden),
            ContentEntity::Project(p) => (p.draft, p.hidden),
            ContentEntity::Changelog(c) => (c.draft, c.hidden),
        };
        !draft && !hidden
    }
}

impl From<Article> for ContentEntity {
    fn from(article: Article) -> Self {
        ContentEntity::Article(article)
    }
}

impl From<Project> for ContentEntity {
    fn from(project: Project) -> Self {
        ContentEntity::Project(project)
    }
}

impl From<ChangelogEntry> for ContentEntity {
    fn from(entry: ChangelogEntry) -> Self {
        ContentEntity::Changelog(entry)
    }
}

/// Dates in content files: RFC 3339 timestamps or bare `YYYY-MM-DD` dates
/// (read as midnight UTC).
pub(crate) mod flexible_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid date `{raw}`: expected RFC 3339 or YYYY-MM-DD"
            ))
        })
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
                de::Error::custom(format!(
                    "invalid date `{raw}`: expected RFC 3339 or YYYY-MM-DD"
                ))
            }),
        }
    }
}
