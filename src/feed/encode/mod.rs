//! Format encoders: `(FeedConfig, [FeedItem]) -> bytes`.
//!
//! Encoders are pure and deterministic: the same config and items always
//! produce the same bytes. Items are checked up front, so an encoder either
//! returns a complete document or an [`EncodeError`], never a partial one.
//!
//! Plain-text fields go through exactly one XML escape ([`escape_html`] for
//! element text, [`escape_attribute`] for attribute values). Pre-rendered
//! HTML is embedded as CDATA and never escaped. Characters XML cannot carry
//! are dropped from both, and carriage returns are written as `&#13;` so
//! they survive line-ending normalization.

mod atom;
mod json;
mod rss;

use chrono::{DateTime, Datelike, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

use super::routes::FeedFormat;
use super::types::{FeedConfig, FeedItem};
use crate::util::{cdata_sections, escape_attribute, escape_html, strip_non_xml_chars};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Item {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Item {id} is updated before it is published")]
    UpdatedBeforePublished { id: String },

    #[error("Date {date} of {context} is outside years 0000-9999")]
    DateOutOfRange { context: String, date: DateTime<Utc> },

    #[error("Failed to write XML: {0}")]
    Xml(String),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes `items` as a complete `format` document.
///
/// # Errors
///
/// Fails without output if any item breaks an encoder invariant (empty id,
/// `updated < published`, a date no format can represent).
pub fn encode(
    format: FeedFormat,
    config: &FeedConfig,
    items: &[FeedItem],
) -> Result<Vec<u8>, EncodeError> {
    validate_items(config, items)?;
    match format {
        FeedFormat::Rss => rss::encode(config, items),
        FeedFormat::Atom => atom::encode(config, items),
        FeedFormat::JsonFeed => json::encode(config, items),
    }
}

/// Checks the invariants every format relies on.
pub fn validate_items(config: &FeedConfig, items: &[FeedItem]) -> Result<(), EncodeError> {
    check_year("build date", config.build_date)?;

    for (index, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(EncodeError::EmptyId { index });
        }
        if item.updated < item.published {
            return Err(EncodeError::UpdatedBeforePublished {
                id: item.id.clone(),
            });
        }
        check_year(&item.id, item.published)?;
        check_year(&item.id, item.updated)?;
    }
    Ok(())
}

fn check_year(context: &str, date: DateTime<Utc>) -> Result<(), EncodeError> {
    if (0..=9999).contains(&date.year()) {
        Ok(())
    } else {
        Err(EncodeError::DateOutOfRange {
            context: context.to_string(),
            date,
        })
    }
}

/// The feed's own timestamp: the newest item update, or the build date for
/// an empty feed.
pub fn latest_update(config: &FeedConfig, items: &[FeedItem]) -> DateTime<Utc> {
    items
        .iter()
        .map(|item| item.updated)
        .max()
        .unwrap_or(config.build_date)
}

/// Adds `name="value"` to `element`, escaping the value once.
///
/// `quick-xml` escapes `(&str, &str)` pairs itself but leaves tab, newline
/// and carriage return alone, so the value is escaped here and pushed as raw
/// bytes.
fn push_attr(element: &mut BytesStart<'_>, name: &str, value: &str) {
    let value = escape_attribute(value);
    element.push_attribute((name.as_bytes(), value.as_bytes()));
}

/// Thin event writer shared by the RSS and Atom encoders.
struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    fn new() -> Result<Self, EncodeError> {
        let mut writer = Self {
            inner: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        };
        writer.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(writer)
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EncodeError> {
        self.inner
            .write_event(event)
            .map_err(|e| EncodeError::Xml(e.to_string()))
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<(), EncodeError> {
        self.write(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<(), EncodeError> {
        self.write(Event::Empty(element))
    }

    /// `<name>text</name>`, with `text` escaped.
    fn text_element(&mut self, name: &str, text: &str) -> Result<(), EncodeError> {
        self.text_element_with(BytesStart::new(name), text)
    }

    fn text_element_with(&mut self, element: BytesStart<'_>, text: &str) -> Result<(), EncodeError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        self.start(element)?;
        self.write(Event::Text(BytesText::from_escaped(escape_html(text))))?;
        self.end(&name)
    }

    /// `<name>` with `html` as CDATA, split wherever it contains `]]>`.
    ///
    /// A carriage return cannot survive inside CDATA, so each one closes the
    /// section and is written as a character reference between sections.
    fn cdata_element(&mut self, element: BytesStart<'_>, html: &str) -> Result<(), EncodeError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let html = strip_non_xml_chars(html);
        self.start(element)?;
        for (i, line) in html.split('\r').enumerate() {
            if i > 0 {
                self.write(Event::Text(BytesText::from_escaped("&#13;")))?;
            }
            for section in cdata_sections(line) {
                if !section.is_empty() {
                    self.write(Event::CData(BytesCData::new(section)))?;
                }
            }
        }
        self.end(&name)
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = self.inner.into_inner().into_inner();
        bytes.push(b'\n');
        bytes
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::feed::types::{Categories, FeedAuthor, FeedConfig, FeedImage, FeedItem, Generator};

    pub fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    pub fn author() -> FeedAuthor {
        FeedAuthor {
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            uri: Some("https://example.com/about".to_string()),
        }
    }

    pub fn config() -> FeedConfig {
        FeedConfig {
            title: "Notes & Things".to_string(),
            description: "Writing <and> projects".to_string(),
            site_link: "https://example.com/".to_string(),
            feed_self_link: "https://example.com/feeds/all.xml".to_string(),
            language: "en".to_string(),
            author: author(),
            generator: Generator {
                name: "syndicate".to_string(),
                version: "0.1.0".to_string(),
                uri: None,
            },
            ttl_minutes: 60,
            build_date: date(2024, 6, 1),
        }
    }

    pub fn item(slug: &str, published: DateTime<Utc>) -> FeedItem {
        let url = format!("https://example.com/blog/{slug}");
        FeedItem {
            id: url.clone(),
            title: format!("Post {slug}"),
            summary: format!("Summary of {slug}"),
            content_html: format!("<p>Body of {slug}</p>"),
            link: url,
            published,
            updated: published,
            categories: Categories::new(),
            author: author(),
            image: None,
        }
    }

    pub fn rich_item() -> FeedItem {
        FeedItem {
            title: "Fish & \"Chips\" <fast>".to_string(),
            summary: "It's <great>".to_string(),
            content_html: "<p>See <code>a]]>b</code></p>".to_string(),
            categories: ["rust", "web"].into_iter().collect(),
            image: Some(FeedImage {
                url: "https://example.com/img/cover.png".to_string(),
                mime_type: "image/png",
                length: None,
            }),
            updated: date(2024, 2, 1),
            ..item("rich", date(2024, 1, 1))
        }
    }

    /// Text fields carrying characters XML 1.0 forbids, plus carriage returns.
    pub fn control_item() -> FeedItem {
        FeedItem {
            title: "Bell \u{7} here".to_string(),
            summary: "Sum\u{1}mary\r\nnext".to_string(),
            content_html: "<p>Bell \u{7} body\u{FFFF}</p>\r\n<p>x]]>y</p>".to_string(),
            categories: ["tab\tbell\u{7}"].into_iter().collect(),
            ..item("control", date(2024, 1, 1))
        }
    }

    /// Text content of every `tag` element, read back by a strict parser.
    ///
    /// Panics when the document is not well-formed XML.
    pub fn texts(xml: &[u8], tag: &str) -> Vec<String> {
        let xml = std::str::from_utf8(xml).unwrap();
        let doc = roxmltree::Document::parse(xml).unwrap_or_else(|e| panic!("{e}\n{xml}"));
        doc.descendants()
            .filter(|node| node.has_tag_name(tag))
            .map(|node| {
                node.descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect()
            })
            .collect()
    }

    /// Value of `attribute` on every `tag` element that has it.
    pub fn attributes(xml: &[u8], tag: &str, attribute: &str) -> Vec<String> {
        let xml = std::str::from_utf8(xml).unwrap();
        let doc = roxmltree::Document::parse(xml).unwrap_or_else(|e| panic!("{e}\n{xml}"));
        doc.descendants()
            .filter(|node| node.has_tag_name(tag))
            .filter_map(|node| node.attribute(attribute).map(str::to_string))
            .collect()
    }
}
