//! Markdown to feed-safe HTML.
//!
//! - `parse` - markdown rendered to HTML, then parsed with `html5ever` into a
//!   [`MarkupDocument`]
//! - `tree` - the document tree, rendering, and the [`NodeVisitor`] walk
//! - `sanitize` - attribute denylist applied through an [`AttributeFilter`]

mod parse;
mod sanitize;
mod tree;

pub use parse::{parse_html_fragment, parse_markdown, render_markdown, MarkupError};
pub use sanitize::{
    is_denylisted, sanitize, try_sanitize, AttributeFilter, SafeHtml, SanitizeError,
    DENYLISTED_ATTRIBUTES, MAX_TREE_DEPTH,
};
pub use tree::{walk_mut, Attribute, Element, MarkupDocument, Node, NodeVisitor};
