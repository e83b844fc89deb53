//! Generic XML output tree and serializer.
//!
//! Every element the exporter produces (WordprocessingML and OMML alike)
//! is one of these nodes. Element and attribute names are always static
//! strings; only attribute values and text content are owned.

#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub name: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<XmlChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Node(XmlNode),
    Text(String),
}

impl XmlNode {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Builder-style child element.
    pub fn child(mut self, node: XmlNode) -> Self {
        self.children.push(XmlChild::Node(node));
        self
    }

    /// Builder-style text child.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlChild::Text(text.into()));
        self
    }

    pub fn push(&mut self, node: XmlNode) {
        self.children.push(XmlChild::Node(node));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlChild::Text(text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The last child element, if the node ends in one.
    pub fn last_element_mut(&mut self) -> Option<&mut XmlNode> {
        match self.children.last_mut() {
            Some(XmlChild::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// Serialize the subtree, appending to `output`.
    pub fn write_to(&self, output: &mut String) {
        output.push('<');
        output.push_str(self.name);
        for (name, value) in &self.attrs {
            output.push(' ');
            output.push_str(name);
            output.push_str("=\"");
            escape_attribute(output, value);
            output.push('"');
        }
        if self.children.is_empty() {
            output.push_str("/>");
            return;
        }
        output.push('>');
        for child in &self.children {
            match child {
                XmlChild::Node(node) => node.write_to(output),
                XmlChild::Text(text) => escape_content(output, text),
            }
        }
        output.push_str("</");
        output.push_str(self.name);
        output.push('>');
    }
}

/// Serialize a full document part: XML declaration plus the root subtree.
pub fn serialize_part(root: &XmlNode) -> String {
    let mut output = String::with_capacity(1024);
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>");
    root.write_to(&mut output);
    output
}

/// Escapes `&`, `<` and `>` in text content.
///
/// Uses `memchr` to skip over runs without special characters.
pub fn escape_content(output: &mut String, input: &str) {
    // SAFETY: only complete UTF-8 sequences are appended below.
    let output = unsafe { output.as_mut_vec() };
    let mut haystack = input.as_bytes();

    while let Some(index) = memchr::memchr3(b'&', b'<', b'>', haystack) {
        let Some((before, after)) = haystack.split_at_checked(index) else {
            break;
        };
        output.extend_from_slice(before);

        let Some((special_char, rest)) = after.split_first() else {
            break;
        };
        match special_char {
            b'&' => output.extend_from_slice(b"&amp;"),
            b'<' => output.extend_from_slice(b"&lt;"),
            b'>' => output.extend_from_slice(b"&gt;"),
            _ => {}
        }
        haystack = rest;
    }

    output.extend_from_slice(haystack);
}

/// Escapes `&`, `<` and `"` for a double-quoted attribute value.
///
/// Attribute values are typically short, so no `memchr` here.
pub fn escape_attribute(output: &mut String, input: &str) {
    // SAFETY: only complete UTF-8 sequences are appended below.
    let output = unsafe { output.as_mut_vec() };
    for ch in input.bytes() {
        match ch {
            b'&' => output.extend_from_slice(b"&amp;"),
            b'<' => output.extend_from_slice(b"&lt;"),
            b'"' => output.extend_from_slice(b"&quot;"),
            _ => output.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_element_self_closes() {
        let mut out = String::new();
        XmlNode::new("w:br").write_to(&mut out);
        assert_eq!(out, "<w:br/>");
    }

    #[test]
    fn attributes_and_text() {
        let mut out = String::new();
        XmlNode::new("w:t")
            .attr("xml:space", "preserve")
            .text("a < b & c")
            .write_to(&mut out);
        assert_eq!(
            out,
            r#"<w:t xml:space="preserve">a &lt; b &amp; c</w:t>"#
        );
    }

    #[test]
    fn attribute_escaping() {
        let mut out = String::new();
        XmlNode::new("m:chr").attr("m:val", "\"<&").write_to(&mut out);
        assert_eq!(out, r#"<m:chr m:val="&quot;&lt;&amp;"/>"#);
    }

    #[test]
    fn nested_structure() {
        let node = XmlNode::new("w:p").child(XmlNode::new("w:r").child(
            XmlNode::new("w:t").text("hi"),
        ));
        let mut out = String::new();
        node.write_to(&mut out);
        assert_eq!(out, "<w:p><w:r><w:t>hi</w:t></w:r></w:p>");
    }

    #[test]
    fn content_escape_cases() {
        let problems = [
            ("", ""),
            ("plain", "plain"),
            ("&<>", "&amp;&lt;&gt;"),
            ("Hello 世界 & <t>", "Hello 世界 &amp; &lt;t&gt;"),
            ("tail&", "tail&amp;"),
        ];
        for (input, expected) in problems {
            let mut out = String::new();
            escape_content(&mut out, input);
            assert_eq!(out, expected, "input: {input:?}");
        }
    }
}
