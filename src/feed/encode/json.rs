//! JSON Feed 1.1 (<https://jsonfeed.org/version/1.1>).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::EncodeError;
use crate::feed::types::{FeedAuthor, FeedConfig, FeedItem};

const VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: &'a str,
    description: &'a str,
    language: &'a str,
    authors: Vec<JsonAuthor<'a>>,
    items: Vec<JsonItem<'a>>,
}

#[derive(Serialize)]
struct JsonAuthor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonItem<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    content_html: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    summary: &'a str,
    date_published: String,
    date_modified: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    authors: Vec<JsonAuthor<'a>>,
}

impl<'a> From<&'a FeedAuthor> for JsonAuthor<'a> {
    fn from(author: &'a FeedAuthor) -> Self {
        Self {
            name: &author.name,
            url: author.uri.as_deref(),
        }
    }
}

impl<'a> From<&'a FeedItem> for JsonItem<'a> {
    fn from(item: &'a FeedItem) -> Self {
        Self {
            id: &item.id,
            url: &item.link,
            title: &item.title,
            content_html: &item.content_html,
            summary: &item.summary,
            date_published: timestamp(item.published),
            date_modified: timestamp(item.updated),
            tags: item.categories.iter().map(String::as_str).collect(),
            image: item.image.as_ref().map(|image| image.url.as_str()),
            authors: vec![JsonAuthor::from(&item.author)],
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(super) fn encode(config: &FeedConfig, items: &[FeedItem]) -> Result<Vec<u8>, EncodeError> {
    let feed = JsonFeed {
        version: VERSION,
        title: &config.title,
        home_page_url: &config.site_link,
        feed_url: &config.feed_self_link,
        description: &config.description,
        language: &config.language,
        authors: vec![JsonAuthor::from(&config.author)],
        items: items.iter().map(JsonItem::from).collect(),
    };

    let mut body = serde_json::to_vec_pretty(&feed)?;
    body.push(b'\n');
    Ok(body)
}
