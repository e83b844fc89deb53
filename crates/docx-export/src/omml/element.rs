//! MathML element model and parser.
//!
//! The external LaTeX converter hands us MathML text; this parses it into
//! a plain element tree under a synthetic `root` wrapper. The tree is the
//! immutable input of the walker — all derived data (resolved styles,
//! n-ary flags) is threaded through the conversion instead of being
//! written back onto these nodes.

use phf::phf_set;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ExportError;

/// Tag names the LaTeX converter can emit. Anything else after a `<` in
/// its output is operator text, not markup.
static MATHML_TAGS: phf::Set<&'static str> = phf_set! {
    "math", "semantics", "annotation",
    "mrow", "mstyle", "mpadded", "mphantom", "merror", "menclose",
    "mi", "mn", "mo", "mtext", "ms", "mspace", "mglyph",
    "mfrac", "msqrt", "mroot",
    "msub", "msup", "msubsup", "munder", "mover", "munderover",
    "mmultiscripts", "mprescripts", "none",
    "mtable", "mtr", "mtd",
};

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MathChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MathChild {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            MathChild::Element(element) => Some(element),
            MathChild::Text(_) => None,
        })
    }

    /// Concatenated text content of the whole subtree.
    pub fn flattened_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                MathChild::Text(text) => out.push_str(text),
                MathChild::Element(element) => element.collect_text(out),
            }
        }
    }

    /// True when a token element carries a non-text child (e.g. `mglyph`).
    /// Such leaves must not join an existing run.
    pub fn has_embedded_glyph(&self) -> bool {
        self.element_children().next().is_some()
    }
}

/// Parse MathML text into an element tree under a synthetic `root`.
///
/// A malformed document is a fatal export error; the walker itself never
/// sees broken XML.
pub fn parse_mathml(xml: &str) -> Result<Element, ExportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = vec![Element::new("root")];

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                stack.push(element_from(e));
            }
            Event::Empty(ref e) => {
                let element = element_from(e);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(MathChild::Element(element));
                }
            }
            Event::Text(ref e) => {
                let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                let text = quick_xml::escape::unescape(&raw)
                    .map(|cow| cow.into_owned())
                    .unwrap_or(raw);
                if !text.is_empty()
                    && let Some(parent) = stack.last_mut()
                {
                    push_text(parent, &text);
                }
            }
            // Entity and character references arrive as their own events.
            Event::GeneralRef(ref e) => {
                let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                let reference = format!("&{name};");
                let text = quick_xml::escape::unescape(&reference)
                    .map(|cow| cow.into_owned())
                    .unwrap_or(reference);
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &text);
                }
            }
            Event::End(_) => {
                if stack.len() > 1
                    && let Some(element) = stack.pop()
                    && let Some(parent) = stack.last_mut()
                {
                    parent.children.push(MathChild::Element(element));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // Unclosed elements: attach whatever is left so no content is lost.
    while stack.len() > 1 {
        if let Some(element) = stack.pop()
            && let Some(parent) = stack.last_mut()
        {
            parent.children.push(MathChild::Element(element));
        }
    }
    Ok(stack.pop().unwrap_or_else(|| Element::new("root")))
}

/// Escape `<` and `&` that occur as raw text in converter output.
///
/// The LaTeX converter writes operator characters unescaped, so `x < y`
/// arrives as `<mo><</mo>`. A `<` counts as markup only when it opens or
/// closes a known MathML tag; a `&` only when it starts a reference.
pub(crate) fn sanitize_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (index, ch) in input.char_indices() {
        let rest = &input.as_bytes()[index + ch.len_utf8()..];
        match ch {
            '<' if !starts_markup(rest) => out.push_str("&lt;"),
            '&' if !starts_reference(rest) => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn starts_markup(rest: &[u8]) -> bool {
    match rest.first() {
        Some(b'!' | b'?') => true,
        Some(_) => {
            let name_start = usize::from(rest[0] == b'/');
            let name_len = rest[name_start..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric())
                .count();
            let name = std::str::from_utf8(&rest[name_start..name_start + name_len])
                .unwrap_or_default();
            MATHML_TAGS.contains(name)
                && matches!(
                    rest.get(name_start + name_len),
                    Some(b' ' | b'\t' | b'\r' | b'\n' | b'/' | b'>')
                )
        }
        None => false,
    }
}

fn starts_reference(rest: &[u8]) -> bool {
    let name_len = rest
        .iter()
        .take(10)
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'#')
        .count();
    name_len > 0 && rest.get(name_len) == Some(&b';')
}

fn push_text(parent: &mut Element, text: &str) {
    if let Some(MathChild::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(MathChild::Text(text.to_string()));
    }
}

fn element_from(e: &quick_xml::events::BytesStart) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    element.attrs = e
        .attributes()
        .filter_map(Result::ok)
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&a.value).into_owned(),
            )
        })
        .collect();
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fraction() {
        let root = parse_mathml("<math><mfrac><mn>1</mn><mn>2</mn></mfrac></math>").unwrap();
        assert_eq!(root.name, "root");
        let math = root.element_children().next().unwrap();
        assert_eq!(math.name, "math");
        let frac = math.element_children().next().unwrap();
        assert_eq!(frac.name, "mfrac");
        let digits: Vec<String> = frac
            .element_children()
            .map(Element::flattened_text)
            .collect();
        assert_eq!(digits, ["1", "2"]);
    }

    #[test]
    fn attributes_and_empty_elements() {
        let root =
            parse_mathml(r#"<mfrac linethickness="0"><mi>a</mi><mspace width="1em"/></mfrac>"#)
                .unwrap();
        let frac = root.element_children().next().unwrap();
        assert_eq!(frac.attr("linethickness"), Some("0"));
        let names: Vec<&str> = frac
            .element_children()
            .map(|child| child.name.as_str())
            .collect();
        assert_eq!(names, ["mi", "mspace"]);
    }

    #[test]
    fn unescapes_entities() {
        let root = parse_mathml("<mo>&lt;&amp;&gt;</mo>").unwrap();
        let op = root.element_children().next().unwrap();
        assert_eq!(op.flattened_text(), "<&>");
    }

    #[test]
    fn references_merge_with_surrounding_text() {
        let root = parse_mathml("<mtext>a&#x2009;b</mtext>").unwrap();
        let text = root.element_children().next().unwrap();
        assert_eq!(text.flattened_text(), "a\u{2009}b");
        assert_eq!(text.children.len(), 1);
    }

    #[test]
    fn sanitize_markup_cases() {
        let problems = [
            ("<mo><</mo>", "<mo>&lt;</mo>"),
            ("<mtext>a & b</mtext>", "<mtext>a &amp; b</mtext>"),
            ("<mi>a<b</mi>", "<mi>a&lt;b</mi>"),
            ("<mo>&lt;</mo>", "<mo>&lt;</mo>"),
            ("<mrow><mi>x</mi></mrow>", "<mrow><mi>x</mi></mrow>"),
            ("<mn>1</mn><mspace width=\"1em\"/>", "<mn>1</mn><mspace width=\"1em\"/>"),
        ];
        for (input, expected) in problems {
            assert_eq!(sanitize_markup(input), expected, "{input}");
        }
    }

    #[test]
    fn sanitized_operator_text_parses() {
        let root = parse_mathml(&sanitize_markup("<math><mi>x</mi><mo><</mo></math>")).unwrap();
        let math = root.element_children().next().unwrap();
        let op = math.element_children().nth(1).unwrap();
        assert_eq!(op.flattened_text(), "<");
    }

    #[test]
    fn malformed_input_is_fatal() {
        assert!(parse_mathml("<math><mi>x</mspan></math>").is_err());
    }

    #[test]
    fn glyph_detection() {
        let root = parse_mathml(r#"<mi><mglyph alt="x"/></mi>"#).unwrap();
        let ident = root.element_children().next().unwrap();
        assert!(ident.has_embedded_glyph());
        let plain = parse_mathml("<mi>x</mi>").unwrap();
        assert!(!plain.element_children().next().unwrap().has_embedded_glyph());
    }
}
