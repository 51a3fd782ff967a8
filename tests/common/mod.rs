//! Shared fixtures for the feed integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use syndicate::config::{AuthorConfig, SiteConfig};
use syndicate::content::{Article, ChangelogEntry, ContentEntity, ImageRef, Project, ProjectLink};
use syndicate::feed::Assembler;

pub fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Fixed "now" so project date fallbacks are reproducible.
pub fn processing_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn site() -> SiteConfig {
    SiteConfig {
        title: "Field Notes".to_string(),
        description: "Writing, projects & release notes".to_string(),
        site_url: "https://example.com".to_string(),
        author: AuthorConfig {
            name: "Ada Example".to_string(),
            email: Some("ada@example.com".to_string()),
            url: Some("https://example.com/about".to_string()),
        },
        ..SiteConfig::default()
    }
}

pub fn assembler() -> Assembler {
    Assembler::new(site())
        .expect("fixture site config is valid")
        .with_processing_date(processing_date())
}

pub fn image(url: &str) -> Option<ImageRef> {
    Some(ImageRef {
        url: url.to_string(),
        alt_text: None,
        length: None,
    })
}

/// A realistic mix: every entity type, footnotes and raw HTML carrying
/// denylisted attributes, special characters, drafts, hidden entries, one
/// body nested too deep to publish, one stray closing tag that the parser
/// repairs, and one project with no usable timeline.
///
/// Visible counts: 2 articles, 2 projects, 1 changelog entry.
pub fn sample_entities() -> Vec<ContentEntity> {
    vec![
        Article {
            description: "First post & \"introductions\" <hello>".to_string(),
            body: "Welcome[^1] to the <span aria-hidden=\"true\" class=\"icon\">*</span> site.\n\n\
                   <div class=\"note\" aria-label=\"Note\">\n\n**Heads up:** it's early.\n\n</div>\n\n\
                   [^1]: Probably.\n"
                .to_string(),
            updated_at: Some(date(2024, 5, 3)),
            tags: vec!["rust".into(), "rust".into(), "web".into()],
            image: image("/img/hello.webp"),
            ..Article::new("hello-world", "Hello, World & <Friends>", date(2024, 5, 1))
        }
        .into(),
        Article {
            description: "Degrades gracefully".to_string(),
            body: format!("Intro\n\n{}", "<div>".repeat(100)),
            tags: vec!["meta".into()],
            ..Article::new("broken-markup", "Broken markup", date(2024, 4, 1))
        }
        .into(),
        Article {
            draft: true,
            ..Article::new("draft-post", "Draft post", date(2024, 6, 1))
        }
        .into(),
        Article {
            hidden: true,
            ..Article::new("hidden-post", "Hidden post", date(2024, 6, 2))
        }
        .into(),
        Project {
            description: "A feed engine".to_string(),
            highlights: vec!["Three formats".to_string()],
            tech_stack: vec!["Rust".to_string(), "Tokio".to_string()],
            links: vec![ProjectLink {
                label: "Source".to_string(),
                url: "https://github.com/example/engine".to_string(),
            }],
            timeline: Some("2022 → Present".to_string()),
            tags: vec!["rust".into()],
            image: image("https://cdn.example.com/engine.BMP"),
            ..Project::new("engine", "Engine")
        }
        .into(),
        Project {
            timeline: Some("TBD".to_string()),
            ..Project::new("someday", "Someday")
        }
        .into(),
        ChangelogEntry {
            summary: "Feeds are live".to_string(),
            // Comments are the one place a literal "]]>" reaches the HTML
            body: "- Added RSS, Atom and JSON feeds\n\n</aside>\n\n<!-- Raw x]]>y survives -->\n"
                .to_string(),
            ..ChangelogEntry::new("v1-0", "v1.0", date(2024, 5, 10))
        }
        .into(),
    ]
}

/// Parses the whole document with a strict XML 1.0 parser, panicking on the
/// first error.
pub fn assert_well_formed(xml: &[u8]) {
    parse(xml);
}

fn parse(xml: &[u8]) -> roxmltree::Document<'_> {
    let text = std::str::from_utf8(xml).expect("UTF-8 document");
    roxmltree::Document::parse(text).unwrap_or_else(|e| panic!("malformed XML: {e}\n{text}"))
}

/// Decoded text of every element whose local name is `name`, CDATA
/// sections joined.
pub fn element_texts(xml: &[u8], name: &str) -> Vec<String> {
    parse(xml)
        .descendants()
        .filter(|node| node.has_tag_name(name))
        .map(|node| {
            node.descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect()
        })
        .collect()
}

/// Value of `attribute` on every element whose local name is `name`.
pub fn element_attributes(xml: &[u8], name: &str, attribute: &str) -> Vec<String> {
    parse(xml)
        .descendants()
        .filter(|node| node.has_tag_name(name))
        .filter_map(|node| node.attribute(attribute).map(str::to_string))
        .collect()
}
