//! RSS 2.0 with the Atom namespace for the self link.

use quick_xml::events::BytesStart;

use super::{latest_update, push_attr, EncodeError, XmlWriter};
use crate::feed::types::{FeedAuthor, FeedConfig, FeedItem};
use crate::util::is_dereferenceable;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

pub(super) fn encode(config: &FeedConfig, items: &[FeedItem]) -> Result<Vec<u8>, EncodeError> {
    let mut xml = XmlWriter::new()?;

    let mut rss = BytesStart::new("rss");
    push_attr(&mut rss, "version", "2.0");
    push_attr(&mut rss, "xmlns:atom", ATOM_NS);
    xml.start(rss)?;
    xml.start(BytesStart::new("channel"))?;

    xml.text_element("title", &config.title)?;
    xml.text_element("link", &config.site_link)?;
    xml.text_element("description", &config.description)?;
    xml.text_element("language", &config.language)?;

    let mut self_link = BytesStart::new("atom:link");
    push_attr(&mut self_link, "href", config.feed_self_link.as_str());
    push_attr(&mut self_link, "rel", "self");
    push_attr(&mut self_link, "type", "application/rss+xml");
    xml.empty(self_link)?;

    let generator = format!("{} {}", config.generator.name, config.generator.version);
    xml.text_element("generator", generator.trim())?;
    xml.text_element("lastBuildDate", &latest_update(config, items).to_rfc2822())?;
    xml.text_element("ttl", &config.ttl_minutes.to_string())?;
    if let Some(editor) = mailbox(&config.author) {
        xml.text_element("managingEditor", &editor)?;
    }

    for item in items {
        write_item(&mut xml, item)?;
    }

    xml.end("channel")?;
    xml.end("rss")?;
    Ok(xml.finish())
}

fn write_item(xml: &mut XmlWriter, item: &FeedItem) -> Result<(), EncodeError> {
    xml.start(BytesStart::new("item"))?;
    xml.text_element("title", &item.title)?;
    xml.text_element("link", &item.link)?;

    let mut guid = BytesStart::new("guid");
    let permalink = if is_dereferenceable(&item.id) { "true" } else { "false" };
    push_attr(&mut guid, "isPermaLink", permalink);
    xml.text_element_with(guid, &item.id)?;

    xml.text_element("pubDate", &item.published.to_rfc2822())?;

    if item.content_html.is_empty() {
        xml.text_element("description", &item.summary)?;
    } else {
        xml.cdata_element(BytesStart::new("description"), &item.content_html)?;
    }

    if let Some(author) = mailbox(&item.author) {
        xml.text_element("author", &author)?;
    }
    for category in &item.categories {
        xml.text_element("category", category)?;
    }

    if let Some(image) = &item.image {
        let length = image.length.unwrap_or(0).to_string();
        let mut enclosure = BytesStart::new("enclosure");
        push_attr(&mut enclosure, "url", image.url.as_str());
        push_attr(&mut enclosure, "type", image.mime_type);
        push_attr(&mut enclosure, "length", length.as_str());
        xml.empty(enclosure)?;
    }

    xml.end("item")
}

/// RSS person fields want `email (Name)`; without an email there is nothing
/// valid to write.
fn mailbox(author: &FeedAuthor) -> Option<String> {
    author
        .email
        .as_deref()
        .map(|email| format!("{email} ({})", author.name))
}
