use crate::util::escape_html;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A parsed HTML document tree.
///
/// Built by [`parse_markdown`](super::parse_markdown) or assembled by hand;
/// rendered with [`MarkupDocument::to_html`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupDocument {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped when rendered.
    Text(String),
    /// HTML passed through verbatim: comments, and the raw text of `script`
    /// and `style` elements.
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// An element attribute.
///
/// `value` is stored in its serialized (entity-encoded) form, ready to be
/// written between double quotes. `None` is a boolean attribute rendered as
/// the bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// Attribute from a plain-text value, escaped here.
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: Some(escape_html(value).into_owned()),
        }
    }

    /// Boolean attribute (`disabled`, `data-footnotes`).
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Concatenated text of all descendants (used for `img` alt text).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Html(_) => {}
        }
    }
}

impl MarkupDocument {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders the tree as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, &mut out);
        out
    }
}

fn render_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Html(html) => out.push_str(html),
            Node::Element(element) => render_element(element, out),
        }
    }
}

fn render_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        if let Some(value) = &attribute.value {
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }

    if is_void_element(&element.name) {
        out.push_str(" />");
        return;
    }

    out.push('>');
    render_nodes(&element.children, out);
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Depth-first visitor over a mutable document tree.
///
/// Traversal lives in [`walk_mut`]; implementations only decide what to do
/// with each node.
pub trait NodeVisitor {
    type Error;

    /// Called before an element's children are visited. `depth` is 1 for
    /// top-level elements.
    fn visit_element(&mut self, element: &mut Element, depth: usize) -> Result<(), Self::Error>;

    fn visit_text(&mut self, _text: &mut String) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walks `nodes` depth-first, handing every element and text node to `visitor`.
///
/// Stops at the first error.
pub fn walk_mut<V: NodeVisitor>(nodes: &mut [Node], visitor: &mut V) -> Result<(), V::Error> {
    walk_level(nodes, visitor, 1)
}

fn walk_level<V: NodeVisitor>(
    nodes: &mut [Node],
    visitor: &mut V,
    depth: usize,
) -> Result<(), V::Error> {
    for node in nodes {
        match node {
            Node::Element(element) => {
                visitor.visit_element(element, depth)?;
                walk_level(&mut element.children, visitor, depth + 1)?;
            }
            Node::Text(text) => visitor.visit_text(text)?,
            Node::Html(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes_text_not_html() {
        let doc = MarkupDocument::new(vec![
            Node::Element(Element::new("p").with_child(Node::Text("a < b & c".to_string()))),
            Node::Html("<!-- keep -->".to_string()),
        ]);
        assert_eq!(doc.to_html(), "<p>a &lt; b &amp; c</p><!-- keep -->");
    }

    #[test]
    fn test_render_attributes() {
        let link = Element::new("a")
            .with_attribute(Attribute::new("href", "https://example.com/?a=1&b=\"2\""))
            .with_attribute(Attribute::flag("data-footnote-ref"))
            .with_child(Node::Text("x".to_string()));
        let doc = MarkupDocument::new(vec![Node::Element(link)]);
        assert_eq!(
            doc.to_html(),
            r#"<a href="https://example.com/?a=1&amp;b=&quot;2&quot;" data-footnote-ref>x</a>"#
        );
    }

    #[test]
    fn test_render_void_element() {
        let img = Element::new("img").with_attribute(Attribute::new("src", "/a.png"));
        let doc = MarkupDocument::new(vec![Node::Element(img)]);
        assert_eq!(doc.to_html(), r#"<img src="/a.png" />"#);
    }

    #[test]
    fn test_text_content() {
        let el = Element::new("span")
            .with_child(Node::Text("a ".to_string()))
            .with_child(Node::Element(
                Element::new("em").with_child(Node::Text("b".to_string())),
            ))
            .with_child(Node::Html("<!-- c -->".to_string()));
        assert_eq!(el.text_content(), "a b");
    }

    struct DepthRecorder {
        seen: Vec<(String, usize)>,
    }

    impl NodeVisitor for DepthRecorder {
        type Error = ();

        fn visit_element(&mut self, element: &mut Element, depth: usize) -> Result<(), ()> {
            self.seen.push((element.name.clone(), depth));
            Ok(())
        }
    }

    #[test]
    fn test_walk_is_depth_first() {
        let mut nodes = vec![
            Node::Element(
                Element::new("ul").with_child(Node::Element(
                    Element::new("li").with_child(Node::Element(Element::new("em"))),
                )),
            ),
            Node::Element(Element::new("p")),
        ];
        let mut recorder = DepthRecorder { seen: Vec::new() };
        walk_mut(&mut nodes, &mut recorder).unwrap();

        let seen: Vec<_> = recorder
            .seen
            .iter()
            .map(|(name, depth)| (name.as_str(), *depth))
            .collect();
        assert_eq!(seen, vec![("ul", 1), ("li", 2), ("em", 3), ("p", 1)]);
    }
}
