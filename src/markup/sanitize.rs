use thiserror::Error;

use super::tree::{walk_mut, Element, MarkupDocument, NodeVisitor};

/// Attributes stripped from feed content.
///
/// These are renderer-specific (footnote wiring and accessibility hooks for
/// the site's own scripts and styles) and mean nothing inside a feed reader.
/// Matched against the whole attribute name, ignoring ASCII case.
pub const DENYLISTED_ATTRIBUTES: [&str; 7] = [
    "data-footnote-ref",
    "data-footnote-backref",
    "data-footnotes",
    "aria-describedby",
    "aria-label",
    "aria-labelledby",
    "aria-hidden",
];

/// Nesting depth beyond which a tree is treated as malformed.
///
/// Enforced when HTML is parsed and again when a tree is sanitized, so hand
/// built trees are held to the same limit.
pub const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("document nesting exceeds {0} levels")]
    TooDeep(usize),
}

/// HTML that has been through the sanitizer. Empty is the failure marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_denylisted(name: &str) -> bool {
    DENYLISTED_ATTRIBUTES
        .iter()
        .any(|denied| denied.eq_ignore_ascii_case(name))
}

/// Visitor that removes every attribute matching `predicate`.
///
/// Also enforces the depth limit, so a single walk both validates and
/// cleans the tree.
pub struct AttributeFilter<P> {
    predicate: P,
    max_depth: usize,
    removed: usize,
}

impl<P: Fn(&str) -> bool> AttributeFilter<P> {
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            max_depth: MAX_TREE_DEPTH,
            removed: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of attributes removed so far.
    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl<P: Fn(&str) -> bool> NodeVisitor for AttributeFilter<P> {
    type Error = SanitizeError;

    fn visit_element(&mut self, element: &mut Element, depth: usize) -> Result<(), SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::TooDeep(self.max_depth));
        }
        let before = element.attributes.len();
        element
            .attributes
            .retain(|attribute| !(self.predicate)(&attribute.name));
        self.removed += before - element.attributes.len();
        Ok(())
    }
}

/// Strips denylisted attributes and renders the result.
///
/// # Errors
///
/// Returns [`SanitizeError::TooDeep`] when the tree nests deeper than
/// [`MAX_TREE_DEPTH`].
pub fn try_sanitize(mut doc: MarkupDocument) -> Result<SafeHtml, SanitizeError> {
    let mut filter = AttributeFilter::new(is_denylisted);
    walk_mut(&mut doc.nodes, &mut filter)?;
    if filter.removed() > 0 {
        tracing::trace!(removed = filter.removed(), "Stripped denylisted attributes");
    }
    Ok(SafeHtml(doc.to_html()))
}

/// Like [`try_sanitize`], but returns the empty marker on failure.
///
/// ```
/// use syndicate::markup::{parse_markdown, sanitize};
///
/// let doc = parse_markdown("Note[^a]\n\n[^a]: Detail").unwrap();
/// let html = sanitize(doc);
/// assert!(html.as_str().contains("href=\"#fn-a\""));
/// assert!(!html.as_str().contains("data-footnote-ref"));
/// ```
pub fn sanitize(doc: MarkupDocument) -> SafeHtml {
    try_sanitize(doc).unwrap_or_default()
}
