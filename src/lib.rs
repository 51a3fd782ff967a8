//! Content syndication engine.
//!
//! Turns articles, portfolio projects and changelog entries into RSS 2.0,
//! Atom 1.0 and JSON Feed 1.1 documents. The engine performs no I/O of its
//! own: content comes in as [`content::ContentEntity`] values and documents
//! come out as bytes in a [`feed::FeedDocument`].
//!
//! - [`config`] - site configuration (`syndicate.toml`)
//! - [`content`] - the content model and providers
//! - [`feed`] - normalization, encoders, assembly, routes
//! - [`markup`] - markdown parsing and sanitization
//! - [`util`] - escaping, MIME inference, URL helpers

pub mod config;
pub mod content;
pub mod feed;
pub mod markup;
pub mod util;

pub use config::{ConfigError, SiteConfig};
pub use feed::{Assembler, FeedDocument, FeedFormat, FeedRoute, FeedVariant};
