//! End-to-end feed generation: content entities in, parsed documents out.

mod common;

use chrono::Duration;
use common::{
    assembler, assert_well_formed, date, element_texts, processing_date, sample_entities, site,
};
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::Value;

use syndicate::config::SiteConfig;
use syndicate::content::{Article, ContentEntity};
use syndicate::feed::{resolve_legacy, Assembler, FeedFormat, FeedRoute, FeedVariant, LEGACY_PATHS};
use syndicate::ConfigError;

fn expected_count(variant: FeedVariant) -> usize {
    match variant {
        FeedVariant::Unified | FeedVariant::Activity => 5,
        FeedVariant::Blog => 2,
        FeedVariant::Projects => 2,
        FeedVariant::Changelog => 1,
    }
}

async fn json_feed(variant: FeedVariant, entities: &[ContentEntity]) -> Value {
    let route = FeedRoute::new(variant, FeedFormat::JsonFeed);
    let doc = assembler().assemble(route, entities, None).await.unwrap();
    serde_json::from_slice(&doc.body).unwrap()
}

fn json_item<'a>(feed: &'a Value, id: &str) -> &'a Value {
    feed["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == id)
        .unwrap_or_else(|| panic!("no item {id}"))
}

#[tokio::test]
async fn test_every_route_parses() {
    let entities = sample_entities();
    let assembler = assembler();

    for route in FeedRoute::all() {
        let doc = assembler.assemble(route, &entities, None).await.unwrap();
        if route.format != FeedFormat::JsonFeed {
            assert_well_formed(&doc.body);
        }

        let feed = feed_rs::parser::parse(&doc.body[..])
            .unwrap_or_else(|e| panic!("{route} does not parse: {e}"));
        assert_eq!(
            feed.entries.len(),
            expected_count(route.variant),
            "entry count for {route}"
        );
    }
}

#[tokio::test]
async fn test_unified_order() {
    let feed = json_feed(FeedVariant::Unified, &sample_entities()).await;
    let ids: Vec<_> = feed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(
        ids,
        vec![
            "https://example.com/projects/someday",
            "https://example.com/changelog#v1-0",
            "https://example.com/blog/hello-world",
            "https://example.com/blog/broken-markup",
            "https://example.com/projects/engine",
        ]
    );
}

#[tokio::test]
async fn test_drafts_and_hidden_never_published() {
    let entities = sample_entities();
    let assembler = assembler();

    for route in FeedRoute::all() {
        let doc = assembler.assemble(route, &entities, None).await.unwrap();
        let body = String::from_utf8(doc.body).unwrap();
        assert!(!body.contains("draft-post"), "{route} leaks a draft");
        assert!(!body.contains("hidden-post"), "{route} leaks a hidden entry");
    }
}

#[tokio::test]
async fn test_accessibility_attributes_stripped() {
    let denylisted = Regex::new(
        r"<[^>]*\s(data-footnote-ref|data-footnote-backref|data-footnotes|aria-describedby|aria-label|aria-labelledby|aria-hidden)[\s=/>]",
    )
    .unwrap();
    let entities = sample_entities();
    let assembler = assembler();

    for variant in FeedVariant::ALL {
        for (route, doc) in assembler.assemble_all(variant, &entities, None).await {
            let body = String::from_utf8(doc.unwrap().body).unwrap();
            assert!(
                !denylisted.is_match(&body),
                "{route} carries a denylisted attribute"
            );
        }
    }

    let feed = json_feed(FeedVariant::Blog, &entities).await;
    let html = json_item(&feed, "https://example.com/blog/hello-world")["content_html"]
        .as_str()
        .unwrap();
    assert!(html.contains("href=\"#fn-1\""));
    assert!(html.contains("class=\"note\""));
    assert!(html.contains("<strong>Heads up:</strong>"));
}

#[tokio::test]
async fn test_malformed_body_degrades_to_metadata() {
    let entities = sample_entities();
    let feed = json_feed(FeedVariant::Blog, &entities).await;
    let item = json_item(&feed, "https://example.com/blog/broken-markup");

    assert_eq!(item["content_html"], "");
    assert_eq!(item["summary"], "Degrades gracefully");
    assert_eq!(item["title"], "Broken markup");

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Rss);
    let doc = assembler().assemble(route, &entities, None).await.unwrap();
    let descriptions = element_texts(&doc.body, "description");
    // Channel description first, then one per item
    assert_eq!(descriptions.len(), 3);
    assert_eq!(descriptions[2], "Degrades gracefully");
}

#[tokio::test]
async fn test_deeply_nested_body_degrades() {
    let mut entities = sample_entities();
    entities.push(
        Article {
            description: "Too deep".to_string(),
            body: "<span>".repeat(20_000),
            ..Article::new("nested", "Nested", date(2024, 4, 2))
        }
        .into(),
    );

    let feed = json_feed(FeedVariant::Blog, &entities).await;
    let item = json_item(&feed, "https://example.com/blog/nested");
    assert_eq!(item["content_html"], "");
    assert_eq!(item["summary"], "Too deep");

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Atom);
    let doc = assembler().assemble(route, &entities, None).await.unwrap();
    assert_well_formed(&doc.body);
    assert!(element_texts(&doc.body, "title").contains(&"Nested".to_string()));
}

#[tokio::test]
async fn test_stray_closing_tag_recovered() {
    let feed = json_feed(FeedVariant::Changelog, &sample_entities()).await;
    let html = json_item(&feed, "https://example.com/changelog#v1-0")["content_html"]
        .as_str()
        .unwrap();

    assert!(html.contains("<li>Added RSS, Atom and JSON feeds</li>"));
    assert!(!html.contains("aside"));
}

#[tokio::test]
async fn test_control_characters_never_reach_xml() {
    let entities: Vec<ContentEntity> = vec![Article {
        description: "Line one\r\nline \u{1}two".to_string(),
        body: "Bell \u{7} in the body\u{FFFE}".to_string(),
        tags: vec!["ta\u{8}g".into()],
        ..Article::new("bell", "Bell \u{7} here", date(2024, 5, 1))
    }
    .into()];
    let assembler = assembler();

    for format in [FeedFormat::Rss, FeedFormat::Atom] {
        let route = FeedRoute::new(FeedVariant::Blog, format);
        let doc = assembler.assemble(route, &entities, None).await.unwrap();
        assert_well_formed(&doc.body);

        assert!(element_texts(&doc.body, "title").contains(&"Bell  here".to_string()));
        if format == FeedFormat::Rss {
            assert_eq!(element_texts(&doc.body, "category"), vec!["tag"]);
        }
        let body = String::from_utf8(doc.body).unwrap();
        assert!(body.contains("Bell  in the body"), "{route}: {body}");
    }

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Atom);
    let doc = assembler.assemble(route, &entities, None).await.unwrap();
    assert_eq!(element_texts(&doc.body, "summary"), vec!["Line one\r\nline two"]);
}

#[tokio::test]
async fn test_cdata_terminator_survives_rss() {
    let route = FeedRoute::new(FeedVariant::Changelog, FeedFormat::Rss);
    let doc = assembler().assemble(route, &sample_entities(), None).await.unwrap();

    let descriptions = element_texts(&doc.body, "description");
    assert!(
        descriptions[1].contains("Raw x]]>y survives"),
        "got {:?}",
        descriptions[1]
    );
}

#[tokio::test]
async fn test_special_characters_round_trip() {
    let entities = sample_entities();
    let title = "Hello, World & <Friends>";

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Atom);
    let doc = assembler().assemble(route, &entities, None).await.unwrap();
    assert!(element_texts(&doc.body, "title").contains(&title.to_string()));
    assert!(element_texts(&doc.body, "summary")
        .contains(&"First post & \"introductions\" <hello>".to_string()));

    let feed = json_feed(FeedVariant::Blog, &entities).await;
    assert_eq!(
        json_item(&feed, "https://example.com/blog/hello-world")["title"],
        title
    );
}

#[tokio::test]
async fn test_project_dates() {
    let feed = json_feed(FeedVariant::Projects, &sample_entities()).await;

    let engine = json_item(&feed, "https://example.com/projects/engine");
    assert_eq!(engine["date_published"], "2022-01-01T00:00:00Z");
    assert_eq!(engine["date_modified"], "2022-01-01T00:00:00Z");

    // No year in the timeline: start of the processing day
    let someday = json_item(&feed, "https://example.com/projects/someday");
    assert_eq!(someday["date_published"], "2024-06-15T00:00:00Z");
}

#[tokio::test]
async fn test_project_body_rendered_from_fields() {
    let feed = json_feed(FeedVariant::Projects, &sample_entities()).await;
    let html = json_item(&feed, "https://example.com/projects/engine")["content_html"]
        .as_str()
        .unwrap();

    assert!(html.contains("A feed engine"));
    assert!(html.contains("Three formats"));
    assert!(html.contains("Tokio"));
    assert!(html.contains("https://github.com/example/engine"));
}

#[tokio::test]
async fn test_article_updated_date() {
    let feed = json_feed(FeedVariant::Blog, &sample_entities()).await;
    let item = json_item(&feed, "https://example.com/blog/hello-world");
    assert_eq!(item["date_published"], "2024-05-01T00:00:00Z");
    assert_eq!(item["date_modified"], "2024-05-03T00:00:00Z");
}

#[tokio::test]
async fn test_enclosure_mime_types() {
    let route = FeedRoute::new(FeedVariant::Unified, FeedFormat::Rss);
    let doc = assembler().assemble(route, &sample_entities(), None).await.unwrap();
    let body = String::from_utf8(doc.body).unwrap();

    assert!(body.contains(
        "<enclosure url=\"https://example.com/img/hello.webp\" type=\"image/webp\" length=\"0\"/>"
    ));
    assert!(body.contains(
        "<enclosure url=\"https://cdn.example.com/engine.BMP\" type=\"image/jpeg\" length=\"0\"/>"
    ));
}

#[tokio::test]
async fn test_categories_deduplicated() {
    let feed = json_feed(FeedVariant::Blog, &sample_entities()).await;
    let item = json_item(&feed, "https://example.com/blog/hello-world");
    assert_eq!(item["tags"], serde_json::json!(["rust", "web"]));

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Rss);
    let doc = assembler().assemble(route, &sample_entities(), None).await.unwrap();
    assert_eq!(element_texts(&doc.body, "category"), vec!["rust", "web", "meta"]);
}

#[tokio::test]
async fn test_limit_keeps_newest() {
    let entities: Vec<ContentEntity> = (0..25)
        .map(|i| {
            Article::new(
                format!("post-{i:02}"),
                format!("Post {i}"),
                processing_date() - Duration::days(i),
            )
            .into()
        })
        .collect();

    let route = FeedRoute::new(FeedVariant::Blog, FeedFormat::Atom);
    let doc = assembler().assemble(route, &entities, None).await.unwrap();
    let feed = feed_rs::parser::parse(&doc.body[..]).unwrap();

    assert_eq!(feed.entries.len(), 20);
    assert_eq!(feed.entries[0].id, "https://example.com/blog/post-00");
    assert_eq!(feed.entries[19].id, "https://example.com/blog/post-19");
    assert!(feed
        .entries
        .windows(2)
        .all(|pair| pair[0].published >= pair[1].published));

    let doc = assembler().assemble(route, &entities, Some(3)).await.unwrap();
    let feed = feed_rs::parser::parse(&doc.body[..]).unwrap();
    assert_eq!(feed.entries.len(), 3);
}

#[tokio::test]
async fn test_generation_is_deterministic() {
    let entities = sample_entities();
    for route in FeedRoute::all() {
        let first = assembler().assemble(route, &entities, None).await.unwrap();
        let second = assembler().assemble(route, &entities, None).await.unwrap();
        assert_eq!(first.body, second.body, "{route} differs between runs");
        assert_eq!(first.etag, second.etag);
    }
}

#[tokio::test]
async fn test_empty_content_yields_valid_feeds() {
    let assembler = assembler();
    for route in FeedRoute::all() {
        let doc = assembler.assemble(route, &[], None).await.unwrap();
        let feed = feed_rs::parser::parse(&doc.body[..]).unwrap();
        assert!(feed.entries.is_empty(), "{route} is not empty");
    }
}

#[test]
fn test_invalid_config_fails_before_encoding() {
    let missing_title = SiteConfig {
        title: String::new(),
        ..site()
    };
    assert!(matches!(
        Assembler::new(missing_title),
        Err(ConfigError::MissingField("title"))
    ));

    let bad_url = SiteConfig {
        site_url: "not a url".to_string(),
        ..site()
    };
    assert!(matches!(
        Assembler::new(bad_url),
        Err(ConfigError::InvalidUrl { field: "site_url", .. })
    ));
}

#[tokio::test]
async fn test_legacy_paths_assemble() {
    let entities = sample_entities();
    let assembler = assembler();

    for (legacy, canonical) in LEGACY_PATHS {
        assert_eq!(resolve_legacy(legacy), Some(*canonical));
        let route = FeedRoute::from_path(canonical).unwrap();
        let doc = assembler.assemble(route, &entities, None).await.unwrap();
        assert!(!doc.body.is_empty(), "{legacy} -> {canonical}");
    }
}

#[tokio::test]
async fn test_feed_titles_per_variant() {
    let entities = sample_entities();
    let assembler = assembler();

    let route = FeedRoute::new(FeedVariant::Unified, FeedFormat::Atom);
    let doc = assembler.assemble(route, &entities, None).await.unwrap();
    let feed = feed_rs::parser::parse(&doc.body[..]).unwrap();
    assert_eq!(feed.title.unwrap().content, "Field Notes");

    let route = FeedRoute::new(FeedVariant::Changelog, FeedFormat::Atom);
    let doc = assembler.assemble(route, &entities, None).await.unwrap();
    let feed = feed_rs::parser::parse(&doc.body[..]).unwrap();
    assert!(feed.title.unwrap().content.starts_with("Field Notes - "));
    assert_eq!(feed.updated, Some(date(2024, 5, 10)));
}
