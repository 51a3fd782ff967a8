//! Content entity to [`FeedItem`] mapping.
//!
//! One exhaustive match per entity type decides the canonical URL, the
//! effective dates and the HTML body. Problems never abort an item: they
//! come back as [`NormalizeWarning`]s next to a (possibly degraded) item.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

use super::types::{Categories, FeedAuthor, FeedImage, FeedItem};
use crate::content::{ContentEntity, ImageRef, Project};
use crate::markup::{parse_markdown, try_sanitize, MarkupError, SanitizeError};
use crate::util::{absolute_url, escape_html, image_mime_type, LinkError};

/// Why an item was degraded or needed a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeWarning {
    #[error("Malformed body markup: {0}")]
    MalformedMarkup(#[from] MarkupError),

    #[error("Body could not be sanitized: {0}")]
    Sanitize(#[from] SanitizeError),

    #[error("No year in project timeline {timeline:?}, using processing date")]
    UninferrableDate { timeline: Option<String> },

    #[error("Invalid image URL {url:?}: {reason}")]
    InvalidImageUrl { url: String, reason: LinkError },

    #[error("Normalization task failed: {0}")]
    TaskFailed(String),
}

/// Per-run inputs shared by every item.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Validated site URL, ending with `/`.
    pub base_url: Url,
    pub author: FeedAuthor,
    /// Fallback date for entities with no usable date of their own.
    pub processing_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub item: FeedItem,
    pub warnings: Vec<NormalizeWarning>,
}

/// Where an entity's effective published date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A date field on the entity.
    Explicit,
    /// January 1 of the first year found in a project timeline.
    TimelineYear(i32),
    /// Nothing usable on the entity.
    ProcessingDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveDate {
    pub at: DateTime<Utc>,
    pub source: DateSource,
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("year regex is valid")
    })
}

/// First standalone four-digit number in a project timeline.
///
/// ```
/// use syndicate::feed::infer_timeline_year;
///
/// assert_eq!(infer_timeline_year("2022 → Present"), Some(2022));
/// assert_eq!(infer_timeline_year("Spring 2019 - 2021"), Some(2019));
/// assert_eq!(infer_timeline_year("ongoing"), None);
/// assert_eq!(infer_timeline_year("v12345"), None);
/// ```
pub fn infer_timeline_year(timeline: &str) -> Option<i32> {
    year_pattern()
        .captures(timeline)
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

/// Resolves the date an entity is sorted and published by.
///
/// Projects with no year in their timeline fall back to the start of the
/// UTC day of `processing_date`, so every run on the same day agrees.
pub fn effective_published(entity: &ContentEntity, processing_date: DateTime<Utc>) -> EffectiveDate {
    let explicit = |at| EffectiveDate {
        at,
        source: DateSource::Explicit,
    };

    match entity {
        ContentEntity::Article(article) => explicit(article.published_at),
        ContentEntity::Changelog(entry) => explicit(entry.date),
        ContentEntity::Project(project) => {
            let from_timeline = project
                .timeline
                .as_deref()
                .and_then(infer_timeline_year)
                .and_then(|year| {
                    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                        .single()
                        .map(|at| EffectiveDate {
                            at,
                            source: DateSource::TimelineYear(year),
                        })
                });

            from_timeline.unwrap_or_else(|| EffectiveDate {
                at: start_of_day(processing_date),
                source: DateSource::ProcessingDate,
            })
        }
    }
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(at)
}

/// Canonical absolute URL of an entity. Doubles as the item id.
pub fn canonical_url(entity: &ContentEntity, base: &Url) -> String {
    let path = match entity {
        ContentEntity::Article(article) => format!("blog/{}", article.slug),
        ContentEntity::Project(project) => format!("projects/{}", project.slug),
        ContentEntity::Changelog(entry) => format!("changelog#{}", entry.slug),
    };
    base.join(&path)
        .map(String::from)
        .unwrap_or_else(|_| format!("{base}{path}"))
}

/// Maps one entity to its feed item.
pub fn normalize(entity: &ContentEntity, ctx: &NormalizeContext) -> Normalized {
    normalize_resolved(entity, effective_published(entity, ctx.processing_date), ctx)
}

/// Like [`normalize`], with the published date already resolved (the
/// assembler resolves dates once, for sorting).
pub fn normalize_resolved(
    entity: &ContentEntity,
    published: EffectiveDate,
    ctx: &NormalizeContext,
) -> Normalized {
    let mut warnings = Vec::new();

    if published.source == DateSource::ProcessingDate {
        if let ContentEntity::Project(project) = entity {
            warnings.push(NormalizeWarning::UninferrableDate {
                timeline: project.timeline.clone(),
            });
        }
    }

    let content_html = match render_body(entity, &ctx.base_url) {
        Ok(html) => html,
        Err(warning) => {
            warnings.push(warning);
            String::new()
        }
    };

    build_item(entity, published.at, content_html, ctx, warnings)
}

/// Item for an entity whose normalization could not run at all: metadata
/// only, no body.
pub fn degraded(
    entity: &ContentEntity,
    published: EffectiveDate,
    ctx: &NormalizeContext,
    reason: impl Into<String>,
) -> Normalized {
    let warnings = vec![NormalizeWarning::TaskFailed(reason.into())];
    build_item(entity, published.at, String::new(), ctx, warnings)
}

fn build_item(
    entity: &ContentEntity,
    published: DateTime<Utc>,
    content_html: String,
    ctx: &NormalizeContext,
    mut warnings: Vec<NormalizeWarning>,
) -> Normalized {
    let updated = match entity {
        ContentEntity::Article(article) => article.updated_at.unwrap_or(published).max(published),
        ContentEntity::Project(_) | ContentEntity::Changelog(_) => published,
    };

    let image = entity
        .image()
        .and_then(|image| match resolve_image(image, &ctx.base_url) {
            Ok(image) => Some(image),
            Err(warning) => {
                warnings.push(warning);
                None
            }
        });

    let link = canonical_url(entity, &ctx.base_url);
    let item = FeedItem {
        id: link.clone(),
        title: entity.title().trim().to_string(),
        summary: entity.summary().trim().to_string(),
        content_html,
        link,
        published,
        updated,
        categories: entity.tags().iter().collect(),
        author: ctx.author.clone(),
        image,
    };

    Normalized { item, warnings }
}

fn render_body(entity: &ContentEntity, base: &Url) -> Result<String, NormalizeWarning> {
    match entity {
        ContentEntity::Article(article) => render_markdown(&article.body),
        ContentEntity::Changelog(entry) => render_markdown(&entry.body),
        ContentEntity::Project(project) => Ok(project_html(project, base)),
    }
}

fn render_markdown(body: &str) -> Result<String, NormalizeWarning> {
    let doc = parse_markdown(body)?;
    Ok(try_sanitize(doc)?.into_string())
}

/// Project pages have no markdown body; the item body is built from the
/// structured fields, escaping each value on its own.
fn project_html(project: &Project, base: &Url) -> String {
    let mut html = String::new();

    let description = project.description.trim();
    if !description.is_empty() {
        html.push_str(&format!("<p>{}</p>", escape_html(description)));
    }

    push_list(&mut html, "Highlights", &project.highlights);
    push_list(&mut html, "Tech stack", &project.tech_stack);

    if !project.links.is_empty() {
        html.push_str("<h3>Links</h3><ul>");
        for link in &project.links {
            let href = absolute_url(base, &link.url)
                .map(String::from)
                .unwrap_or_else(|_| link.url.trim().to_string());
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&href),
                escape_html(link.label.trim())
            ));
        }
        html.push_str("</ul>");
    }

    html
}

fn push_list(html: &mut String, heading: &str, entries: &[String]) {
    let entries: Vec<&str> = entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return;
    }

    html.push_str(&format!("<h3>{heading}</h3><ul>"));
    for entry in entries {
        html.push_str(&format!("<li>{}</li>", escape_html(entry)));
    }
    html.push_str("</ul>");
}

fn resolve_image(image: &ImageRef, base: &Url) -> Result<FeedImage, NormalizeWarning> {
    let url = absolute_url(base, &image.url).map_err(|reason| NormalizeWarning::InvalidImageUrl {
        url: image.url.clone(),
        reason,
    })?;

    Ok(FeedImage {
        mime_type: image_mime_type(url.path()),
        url: url.into(),
        length: image.length,
    })
}
