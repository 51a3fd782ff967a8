//! Utility functions shared by the sanitizer, normalizer and encoders.
//!
//! This module provides reusable utilities for:
//!
//! - **Escaping**: the single XML/HTML escape pass for plain text and
//!   attribute values, and CDATA splitting for pre-rendered HTML
//! - **MIME inference**: image enclosure types from file extensions
//! - **Links**: site URL validation and absolute URL resolution
//!
//! # Examples
//!
//! ```
//! use syndicate::util::{absolute_url, escape_html, image_mime_type, parse_site_url};
//!
//! let base = parse_site_url("https://example.com").unwrap();
//! let cover = absolute_url(&base, "/img/cover.webp").unwrap();
//! assert_eq!(cover.as_str(), "https://example.com/img/cover.webp");
//! assert_eq!(image_mime_type(cover.path()), "image/webp");
//! assert_eq!(escape_html("a < b"), "a &lt; b");
//! ```

mod escape;
mod links;
mod mime;

pub use escape::{cdata_sections, escape_attribute, escape_html, is_xml_char, strip_non_xml_chars};
pub use links::{absolute_url, is_dereferenceable, parse_site_url, LinkError};
pub use mime::{image_mime_type, DEFAULT_IMAGE_MIME};
