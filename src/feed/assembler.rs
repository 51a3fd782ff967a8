use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use super::encode::{encode, EncodeError};
use super::normalize::{
    degraded, effective_published, normalize_resolved, EffectiveDate, NormalizeContext, Normalized,
};
use super::routes::{FeedFormat, FeedRoute, FeedVariant};
use super::types::{FeedAuthor, FeedConfig, FeedItem};
use crate::config::{ConfigError, SiteConfig};
use crate::content::ContentEntity;

/// Upper bound on items normalized at once.
pub const MAX_CONCURRENCY: usize = 50;

/// Errors that can occur while assembling a feed document.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Invalid feed configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to encode {format} feed: {source}")]
    Encode {
        format: FeedFormat,
        #[source]
        source: EncodeError,
    },
}

/// A finished feed, ready to serve or write out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// Suggested cache lifetime. Advisory only.
    pub ttl_seconds: u32,
    /// Quoted hex SHA-256 of `body`, for HTTP revalidation.
    pub etag: String,
}

impl FeedDocument {
    fn new(route: FeedRoute, body: Vec<u8>) -> Self {
        let hash = Sha256::digest(&body);
        Self {
            content_type: route.format.content_type(),
            ttl_seconds: route.variant.ttl_seconds(),
            etag: format!("\"{:x}\"", hash),
            body,
        }
    }
}

/// Builds feed documents from content entities.
///
/// Construction validates the site configuration, so a misconfigured site
/// fails before any content is touched. The assembler holds no mutable
/// state; share it freely.
///
/// # Example
///
/// ```no_run
/// use syndicate::config::SiteConfig;
/// use syndicate::feed::{Assembler, FeedFormat, FeedRoute, FeedVariant};
///
/// # async fn run(site: SiteConfig, entities: Vec<syndicate::content::ContentEntity>) -> anyhow::Result<()> {
/// let assembler = Assembler::new(site)?;
/// let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Atom);
/// let doc = assembler.assemble(route, &entities, None).await?;
/// println!("{} bytes, etag {}", doc.body.len(), doc.etag);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Assembler {
    site: Arc<SiteConfig>,
    base_url: Url,
    author: FeedAuthor,
    processing_date: Option<DateTime<Utc>>,
}

impl Assembler {
    pub fn new(site: SiteConfig) -> Result<Self, ConfigError> {
        let base_url = site.validate()?;
        Ok(Self {
            author: FeedAuthor::from_config(&site.author),
            site: Arc::new(site),
            base_url,
            processing_date: None,
        })
    }

    /// Pins the processing date instead of reading the clock on every call.
    pub fn with_processing_date(mut self, at: DateTime<Utc>) -> Self {
        self.processing_date = Some(at);
        self
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Configured item limit for `variant`.
    pub fn limit_for(&self, variant: FeedVariant) -> usize {
        self.site.limits.for_variant(variant) as usize
    }

    pub fn feed_config(
        &self,
        route: FeedRoute,
        build_date: DateTime<Utc>,
    ) -> Result<FeedConfig, ConfigError> {
        FeedConfig::for_route(&self.site, &self.base_url, route, build_date)
    }

    fn processing_date(&self) -> DateTime<Utc> {
        self.processing_date.unwrap_or_else(Utc::now)
    }

    /// Assembles one `(variant, format)` document.
    ///
    /// `limit` overrides the configured item limit for the variant.
    pub async fn assemble(
        &self,
        route: FeedRoute,
        entities: &[ContentEntity],
        limit: Option<usize>,
    ) -> Result<FeedDocument, AssembleError> {
        let now = self.processing_date();
        let config = self.feed_config(route, now)?;
        let items = self.items(route.variant, entities, limit, now).await;
        encode_document(route, &config, &items)
    }

    /// Assembles every format of `variant`, normalizing the items once.
    ///
    /// Each format succeeds or fails on its own.
    pub async fn assemble_all(
        &self,
        variant: FeedVariant,
        entities: &[ContentEntity],
        limit: Option<usize>,
    ) -> Vec<(FeedRoute, Result<FeedDocument, AssembleError>)> {
        let now = self.processing_date();
        let items = self.items(variant, entities, limit, now).await;

        FeedFormat::ALL
            .into_iter()
            .map(|format| {
                let route = FeedRoute::new(variant, format);
                let document = self
                    .feed_config(route, now)
                    .map_err(AssembleError::from)
                    .and_then(|config| encode_document(route, &config, &items));
                (route, document)
            })
            .collect()
    }

    /// Selects and normalizes the items of `variant`, newest first.
    ///
    /// Items are normalized concurrently on the blocking pool and re-joined
    /// in sorted order. A task that panics degrades only its own item.
    pub async fn items(
        &self,
        variant: FeedVariant,
        entities: &[ContentEntity],
        limit: Option<usize>,
        processing_date: DateTime<Utc>,
    ) -> Vec<FeedItem> {
        let limit = limit.unwrap_or_else(|| self.limit_for(variant));
        let selected = select_entities(variant, entities, limit, processing_date);
        if selected.is_empty() {
            return Vec::new();
        }

        let ctx = Arc::new(NormalizeContext {
            base_url: self.base_url.clone(),
            author: self.author.clone(),
            processing_date,
        });

        let results: Vec<Normalized> = stream::iter(selected)
            .map(|(published, entity)| {
                let ctx = Arc::clone(&ctx);
                let entity = Arc::new(entity.clone());
                async move {
                    let task_ctx = Arc::clone(&ctx);
                    let task_entity = Arc::clone(&entity);
                    let task = tokio::task::spawn_blocking(move || {
                        normalize_resolved(&task_entity, published, &task_ctx)
                    });
                    match task.await {
                        Ok(normalized) => normalized,
                        Err(e) => degraded(&entity, published, &ctx, e.to_string()),
                    }
                }
            })
            .buffered(limit.clamp(1, MAX_CONCURRENCY))
            .collect()
            .await;

        results
            .into_iter()
            .map(|Normalized { item, warnings }| {
                for warning in &warnings {
                    tracing::warn!(
                        variant = %variant,
                        entity = %item.id,
                        error = %warning,
                        "Feed item normalized with warnings"
                    );
                }
                item
            })
            .collect()
    }
}

/// Filters `entities` for `variant`, drops drafts and hidden entries, sorts
/// newest first (ties by slug, ascending) and keeps the first `limit`.
pub fn select_entities(
    variant: FeedVariant,
    entities: &[ContentEntity],
    limit: usize,
    processing_date: DateTime<Utc>,
) -> Vec<(EffectiveDate, &ContentEntity)> {
    let mut selected: Vec<_> = entities
        .iter()
        .filter(|entity| variant.includes(entity.kind()) && entity.is_visible())
        .map(|entity| (effective_published(entity, processing_date), entity))
        .collect();

    selected.sort_by(|(a_date, a), (b_date, b)| {
        b_date
            .at
            .cmp(&a_date.at)
            .then_with(|| a.slug().cmp(b.slug()))
    });
    selected.truncate(limit);
    selected
}

fn encode_document(
    route: FeedRoute,
    config: &FeedConfig,
    items: &[FeedItem],
) -> Result<FeedDocument, AssembleError> {
    let body = encode(route.format, config, items).map_err(|source| AssembleError::Encode {
        format: route.format,
        source,
    })?;

    tracing::debug!(
        route = %route,
        items = items.len(),
        bytes = body.len(),
        "Encoded feed"
    );
    Ok(FeedDocument::new(route, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthorConfig;
    use crate::content::{Article, ChangelogEntry, Project};
    use chrono::{Duration, TimeZone};

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Field Notes".to_string(),
            site_url: "https://example.com".to_string(),
            author: AuthorConfig {
                name: "Ada".to_string(),
                ..AuthorConfig::default()
            },
            ..SiteConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn assembler() -> Assembler {
        Assembler::new(site()).unwrap().with_processing_date(now())
    }

    fn article(slug: &str, days_ago: i64) -> ContentEntity {
        Article::new(slug, slug.to_uppercase(), now() - Duration::days(days_ago)).into()
    }

    fn mixed() -> Vec<ContentEntity> {
        vec![
            article("a", 3),
            Project {
                timeline: Some("2023 → Present".to_string()),
                ..Project::new("p", "P")
            }
            .into(),
            ChangelogEntry::new("v1", "v1", now() - Duration::days(1)).into(),
            Article {
                draft: true,
                ..Article::new("draft", "Draft", now())
            }
            .into(),
        ]
    }

    fn slugs(selected: &[(EffectiveDate, &ContentEntity)]) -> Vec<String> {
        selected.iter().map(|(_, e)| e.slug().to_string()).collect()
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let err = Assembler::new(SiteConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("title")));
    }

    #[test]
    fn test_select_by_variant() {
        let entities = mixed();
        assert_eq!(
            slugs(&select_entities(FeedVariant::Unified, &entities, 20, now())),
            vec!["v1", "a", "p"]
        );
        assert_eq!(slugs(&select_entities(FeedVariant::Blog, &entities, 20, now())), vec!["a"]);
        assert_eq!(
            slugs(&select_entities(FeedVariant::Projects, &entities, 20, now())),
            vec!["p"]
        );
        assert_eq!(
            slugs(&select_entities(FeedVariant::Changelog, &entities, 20, now())),
            vec!["v1"]
        );
    }

    #[test]
    fn test_select_orders_and_truncates() {
        let entities: Vec<_> = (0..25).map(|i| article(&format!("post-{i:02}"), i)).collect();
        let selected = select_entities(FeedVariant::Blog, &entities, 20, now());

        assert_eq!(selected.len(), 20);
        assert_eq!(selected[0].1.slug(), "post-00");
        assert_eq!(selected[19].1.slug(), "post-19");
        assert!(selected.windows(2).all(|pair| pair[0].0.at >= pair[1].0.at));
    }

    #[test]
    fn test_select_ties_broken_by_slug() {
        let entities = vec![article("c", 1), article("a", 1), article("b", 1)];
        assert_eq!(
            slugs(&select_entities(FeedVariant::Blog, &entities, 20, now())),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_select_limit_zero() {
        assert!(select_entities(FeedVariant::Unified, &mixed(), 0, now()).is_empty());
    }

    #[tokio::test]
    async fn test_items_keep_sorted_order() {
        let entities: Vec<_> = (0..60).map(|i| article(&format!("post-{i:02}"), i)).collect();
        let items = assembler()
            .items(FeedVariant::Activity, &entities, None, now())
            .await;

        assert_eq!(items.len(), 50);
        let expected: Vec<_> = (0..50)
            .map(|i| format!("https://example.com/blog/post-{i:02}"))
            .collect();
        let ids: Vec<_> = items.iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_assemble_document_metadata() {
        let route = FeedRoute::new(FeedVariant::Projects, FeedFormat::Atom);
        let doc = assembler().assemble(route, &mixed(), None).await.unwrap();

        assert_eq!(doc.content_type, "application/atom+xml; charset=utf-8");
        assert_eq!(doc.ttl_seconds, 86400);
        assert_eq!(doc.etag.len(), 66);
        assert!(doc.etag.starts_with('"') && doc.etag.ends_with('"'));

        let body = String::from_utf8(doc.body).unwrap();
        assert!(body.contains("<id>https://example.com/projects/p</id>"));
        assert!(!body.contains("blog/a"));
    }

    #[tokio::test]
    async fn test_assemble_is_deterministic() {
        let route = FeedRoute::new(FeedVariant::Unified, FeedFormat::Rss);
        let first = assembler().assemble(route, &mixed(), None).await.unwrap();
        let second = assembler().assemble(route, &mixed(), None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_assemble_all_formats() {
        let documents = assembler()
            .assemble_all(FeedVariant::Changelog, &mixed(), None)
            .await;

        let routes: Vec<_> = documents.iter().map(|(route, _)| route.path()).collect();
        assert_eq!(
            routes,
            vec!["/feeds/changelog.xml", "/feeds/changelog.atom", "/feeds/changelog.json"]
        );
        assert!(documents.iter().all(|(_, doc)| doc.is_ok()));
    }

    #[tokio::test]
    async fn test_empty_feed_is_valid() {
        let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::JsonFeed);
        let doc = assembler().assemble(route, &[], None).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&doc.body).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
