use std::borrow::Cow;

/// Marker that terminates a CDATA section.
const CDATA_END: &str = "]]>";

/// Whether `c` may appear in an XML 1.0 document at all.
///
/// Excludes the C0 controls other than tab, newline and carriage return,
/// and the non-characters U+FFFE and U+FFFF. Surrogates cannot occur in a
/// `char`.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drops every character no XML document may contain.
///
/// ```
/// use syndicate::util::strip_non_xml_chars;
///
/// assert_eq!(strip_non_xml_chars("Bell \u{7} here"), "Bell  here");
/// assert_eq!(strip_non_xml_chars("tab\tok"), "tab\tok");
/// ```
pub fn strip_non_xml_chars(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// Escapes text for inclusion in HTML or XML element content.
///
/// Replaces `&`, `<`, `>`, `"` and `'` with entity references and a carriage
/// return with `&#13;`, which parsers would otherwise fold into a newline.
/// Characters XML cannot carry are dropped. This is the single escape pass
/// applied to plain-text values; callers must never feed already-escaped
/// markup through it.
///
/// Returns `Cow::Borrowed` when nothing needs escaping.
///
/// # Examples
///
/// ```
/// use syndicate::util::escape_html;
///
/// assert_eq!(escape_html("Fish & Chips"), "Fish &amp; Chips");
/// assert_eq!(escape_html("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;");
/// assert_eq!(escape_html("a\r\nb"), "a&#13;\nb");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| c == '\r')
}

/// Like [`escape_html`], for attribute values: tab and newline are also
/// written as character references, since attribute value normalization
/// would turn them into spaces.
///
/// ```
/// use syndicate::util::escape_attribute;
///
/// assert_eq!(escape_attribute("a\tb\nc"), "a&#9;b&#10;c");
/// ```
pub fn escape_attribute(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| matches!(c, '\t' | '\n' | '\r'))
}

fn escape_with(s: &str, as_reference: impl Fn(char) -> bool) -> Cow<'_, str> {
    let special = |c: char| as_reference(c) || !is_xml_char(c);
    if !s.contains(special) {
        return quick_xml::escape::escape(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if !special(c) {
            continue;
        }
        out.push_str(&quick_xml::escape::escape(&s[start..i]));
        if is_xml_char(c) {
            out.push_str(&format!("&#{};", u32::from(c)));
        }
        start = i + c.len_utf8();
    }
    out.push_str(&quick_xml::escape::escape(&s[start..]));
    Cow::Owned(out)
}

/// Splits HTML into pieces that can each be wrapped in a CDATA section.
///
/// A literal `]]>` cannot appear inside CDATA, so the content is cut between
/// `]]` and `>`. Writing every piece as its own CDATA section reproduces the
/// original text exactly when the document is parsed.
///
/// Always returns at least one (possibly empty) piece.
pub fn cdata_sections(content: &str) -> Vec<&str> {
    let mut sections = Vec::with_capacity(1);
    let mut start = 0;

    while let Some(offset) = content[start..].find(CDATA_END) {
        // Keep "]]" in this section, ">" starts the next one
        let cut = start + offset + 2;
        sections.push(&content[start..cut]);
        start = cut;
    }
    sections.push(&content[start..]);

    sections
}
