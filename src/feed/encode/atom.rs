//! Atom 1.0 (RFC 4287).

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::BytesStart;

use super::{latest_update, push_attr, EncodeError, XmlWriter};
use crate::feed::types::{FeedAuthor, FeedConfig, FeedItem};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn link(rel: &str, kind: &str, href: &str) -> BytesStart<'static> {
    let mut link = BytesStart::new("link");
    push_attr(&mut link, "rel", rel);
    push_attr(&mut link, "type", kind);
    push_attr(&mut link, "href", href);
    link.into_owned()
}

pub(super) fn encode(config: &FeedConfig, items: &[FeedItem]) -> Result<Vec<u8>, EncodeError> {
    let mut xml = XmlWriter::new()?;

    let mut feed = BytesStart::new("feed");
    push_attr(&mut feed, "xmlns", ATOM_NS);
    push_attr(&mut feed, "xml:lang", config.language.as_str());
    xml.start(feed)?;

    xml.text_element("title", &config.title)?;
    xml.text_element("subtitle", &config.description)?;
    xml.text_element("id", &config.feed_self_link)?;
    xml.text_element("updated", &timestamp(latest_update(config, items)))?;
    xml.empty(link("self", "application/atom+xml", &config.feed_self_link))?;
    xml.empty(link("alternate", "text/html", &config.site_link))?;
    write_author(&mut xml, &config.author)?;

    let mut generator = BytesStart::new("generator");
    if let Some(uri) = &config.generator.uri {
        push_attr(&mut generator, "uri", uri.as_str());
    }
    push_attr(&mut generator, "version", config.generator.version.as_str());
    xml.text_element_with(generator, &config.generator.name)?;

    for item in items {
        write_entry(&mut xml, item)?;
    }

    xml.end("feed")?;
    Ok(xml.finish())
}

fn write_entry(xml: &mut XmlWriter, item: &FeedItem) -> Result<(), EncodeError> {
    xml.start(BytesStart::new("entry"))?;
    xml.text_element("title", &item.title)?;
    xml.text_element("id", &item.id)?;
    xml.text_element("published", &timestamp(item.published))?;
    xml.text_element("updated", &timestamp(item.updated))?;
    xml.empty(link("alternate", "text/html", &item.link))?;

    if let Some(image) = &item.image {
        let mut enclosure = link("enclosure", image.mime_type, &image.url);
        if let Some(length) = image.length {
            push_attr(&mut enclosure, "length", length.to_string().as_str());
        }
        xml.empty(enclosure)?;
    }

    write_author(xml, &item.author)?;

    for category in &item.categories {
        let mut element = BytesStart::new("category");
        push_attr(&mut element, "term", category.as_str());
        push_attr(&mut element, "label", category.as_str());
        xml.empty(element)?;
    }

    if !item.summary.is_empty() {
        let mut summary = BytesStart::new("summary");
        push_attr(&mut summary, "type", "text");
        xml.text_element_with(summary, &item.summary)?;
    }
    if !item.content_html.is_empty() {
        let mut content = BytesStart::new("content");
        push_attr(&mut content, "type", "html");
        xml.cdata_element(content, &item.content_html)?;
    }

    xml.end("entry")
}

fn write_author(xml: &mut XmlWriter, author: &FeedAuthor) -> Result<(), EncodeError> {
    xml.start(BytesStart::new("author"))?;
    xml.text_element("name", &author.name)?;
    if let Some(email) = &author.email {
        xml.text_element("email", email)?;
    }
    if let Some(uri) = &author.uri {
        xml.text_element("uri", uri)?;
    }
    xml.end("author")
}
