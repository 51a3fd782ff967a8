use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use thiserror::Error;

use super::sanitize::MAX_TREE_DEPTH;
use super::tree::{Attribute, Element, MarkupDocument, Node};
use crate::util::{escape_attribute, is_xml_char};

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// `id` of the footnotes heading that references point at.
const FOOTNOTE_LABEL_ID: &str = "footnote-label";

/// Errors for markup that cannot be turned into a document tree.
///
/// HTML parsing itself never fails: misnested, unclosed and stray tags are
/// repaired the way browsers repair them. Only a tree too deep to walk safely
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("markup nesting exceeds {0} levels")]
    TooDeep(usize),
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Parses markdown (including embedded raw HTML) into a document tree.
///
/// The markdown is rendered to HTML first, then the HTML is parsed as a body
/// fragment, so raw HTML in the source becomes real elements with attribute
/// lists and later passes never work on strings. Footnotes are rendered the
/// way GFM renderers emit them, accessibility attributes included.
///
/// # Errors
///
/// Returns [`MarkupError::TooDeep`] when elements nest deeper than
/// [`MAX_TREE_DEPTH`](super::MAX_TREE_DEPTH).
///
/// # Examples
///
/// ```
/// use syndicate::markup::parse_markdown;
///
/// let doc = parse_markdown("Hello *world*").unwrap();
/// assert_eq!(doc.to_html(), "<p>Hello <em>world</em></p>\n");
///
/// // Stray closing tags are dropped, not fatal
/// let html = parse_markdown("Intro\n\n</section>\n").unwrap().to_html();
/// assert_eq!(html.trim_end(), "<p>Intro</p>");
/// ```
pub fn parse_markdown(source: &str) -> Result<MarkupDocument, MarkupError> {
    parse_html_fragment(&render_markdown(source))
}

/// Renders markdown to an HTML string, footnotes included.
pub fn render_markdown(source: &str) -> String {
    let mut footnotes = Footnotes::default();
    let mut body = Vec::new();
    // Events of the footnote definition being read, if any
    let mut definition: Option<(String, Vec<Event<'_>>)> = None;

    for event in Parser::new_ext(source, markdown_options()) {
        let event = match event {
            Event::Start(Tag::FootnoteDefinition(label)) => {
                definition = Some((label.into_string(), Vec::new()));
                continue;
            }
            Event::End(TagEnd::FootnoteDefinition) => {
                if let Some((label, events)) = definition.take() {
                    footnotes.define(label, events);
                }
                continue;
            }
            Event::FootnoteReference(label) => footnotes.reference(&label),
            event => event,
        };
        match definition.as_mut() {
            Some((_, events)) => events.push(event),
            None => body.push(event),
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, body.into_iter());
    footnotes.render(&mut out);
    out
}

/// Footnote bookkeeping: reference numbers in order of first use, and
/// definitions in source order.
#[derive(Default)]
struct Footnotes<'a> {
    numbers: HashMap<String, usize>,
    definitions: Vec<(String, Vec<Event<'a>>)>,
}

impl<'a> Footnotes<'a> {
    fn reference(&mut self, label: &str) -> Event<'a> {
        let next = self.numbers.len() + 1;
        let number = *self.numbers.entry(label.to_string()).or_insert(next);
        let label = escape_attribute(label);

        Event::InlineHtml(CowStr::from(format!(
            "<sup><a href=\"#fn-{label}\" id=\"fnref-{label}\" data-footnote-ref \
             aria-describedby=\"{FOOTNOTE_LABEL_ID}\">{number}</a></sup>"
        )))
    }

    fn define(&mut self, label: String, events: Vec<Event<'a>>) {
        self.definitions.push((label, events));
    }

    fn render(self, out: &mut String) {
        if self.definitions.is_empty() {
            return;
        }

        out.push_str("<section data-footnotes class=\"footnotes\">");
        out.push_str(&format!(
            "<h2 id=\"{FOOTNOTE_LABEL_ID}\" class=\"sr-only\">Footnotes</h2>\n<ol>\n"
        ));
        for (label, mut events) in self.definitions {
            let reference = self
                .numbers
                .get(&label)
                .map(usize::to_string)
                .unwrap_or_else(|| label.clone());
            let label = escape_attribute(&label);
            let backref = Event::InlineHtml(CowStr::from(format!(
                " <a href=\"#fnref-{label}\" data-footnote-backref \
                 aria-label=\"Back to reference {}\" class=\"footnote-backref\">↩</a>",
                escape_attribute(&reference)
            )));

            // The back-link goes inside the last paragraph when there is one
            let at = events
                .iter()
                .rposition(|event| matches!(event, Event::End(TagEnd::Paragraph)))
                .unwrap_or(events.len());
            events.insert(at, backref);

            out.push_str(&format!("<li id=\"fn-{label}\">\n"));
            html::push_html(out, events.into_iter());
            out.push_str("</li>\n");
        }
        out.push_str("</ol>\n</section>\n");
    }
}

/// Parses an HTML body fragment into a document tree.
///
/// Parsing follows the HTML5 algorithm, so any input produces a tree. Text is
/// decoded into [`Node::Text`]; comments and the bodies of `script` and
/// `style` are kept verbatim as [`Node::Html`].
///
/// # Errors
///
/// Returns [`MarkupError::TooDeep`] when elements nest deeper than
/// [`MAX_TREE_DEPTH`](super::MAX_TREE_DEPTH). The check happens while the
/// parsed DOM is converted, so no recursion ever goes deeper than the limit.
pub fn parse_html_fragment(html: &str) -> Result<MarkupDocument, MarkupError> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(html);

    // The fragment's nodes hang off a synthetic <html> root
    let mut nodes = Vec::new();
    for root in dom.document.children.borrow().iter() {
        nodes.extend(convert_children(root, 1, false)?);
    }
    Ok(MarkupDocument::new(nodes))
}

fn convert_children(parent: &Handle, depth: usize, raw_text: bool) -> Result<Vec<Node>, MarkupError> {
    let mut nodes = Vec::new();

    for child in parent.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                nodes.push(if raw_text {
                    Node::Html(text)
                } else {
                    Node::Text(text)
                });
            }
            NodeData::Comment { contents } => nodes.push(Node::Html(format!("<!--{contents}-->"))),
            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                if depth > MAX_TREE_DEPTH {
                    return Err(MarkupError::TooDeep(MAX_TREE_DEPTH));
                }

                let tag = name.local.to_string();
                let raw_text = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
                let attributes = attrs.borrow().iter().filter_map(convert_attribute).collect();

                // <template> keeps its children in a separate fragment
                let template = template_contents.borrow();
                let source = template.as_ref().unwrap_or(child);
                let children = convert_children(source, depth + 1, raw_text)?;

                if is_serializable_name(&tag) {
                    nodes.push(Node::Element(Element {
                        name: tag,
                        attributes,
                        children,
                    }));
                } else {
                    nodes.extend(children);
                }
            }
            _ => {}
        }
    }

    Ok(nodes)
}

/// Names the parser accepted from broken markup (`<b "x">`) that cannot be
/// written back out as a tag or attribute name.
fn is_serializable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(|c: char| {
            c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=') || !is_xml_char(c)
        })
}

fn convert_attribute(attribute: &html5ever::Attribute) -> Option<Attribute> {
    let name = match &attribute.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attribute.name.local),
        None => attribute.name.local.to_string(),
    };
    if !is_serializable_name(&name) {
        return None;
    }
    Some(if attribute.value.is_empty() {
        Attribute::flag(name)
    } else {
        Attribute::new(name, &attribute.value)
    })
}
