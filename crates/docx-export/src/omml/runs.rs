//! Run construction and adjacent-run coalescing.

use crate::xml::{XmlChild, XmlNode};

use super::element::Element;
use super::style::MathStyle;

/// Merge-relevant category of a MathML token element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Identifier,
    Number,
    Operator,
    Text,
    StringLiteral,
}

impl TokenCategory {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mi" => Some(TokenCategory::Identifier),
            "mn" => Some(TokenCategory::Number),
            "mo" => Some(TokenCategory::Operator),
            "mtext" => Some(TokenCategory::Text),
            "ms" => Some(TokenCategory::StringLiteral),
            _ => None,
        }
    }
}

/// Data about the run produced for the previous sibling, threaded through
/// the walk instead of being written onto the input tree.
#[derive(Debug, Clone)]
pub struct PrevRun {
    pub style: MathStyle,
    pub category: TokenCategory,
    pub has_glyph: bool,
}

/// Identifiers, numbers and operators coalesce freely with each other;
/// text and string-literal leaves only with their own kind. Inherited
/// behavior, preserved as-is.
pub fn same_bucket(a: TokenCategory, b: TokenCategory) -> bool {
    if a == b {
        return true;
    }
    let interchangeable = |category| {
        matches!(
            category,
            TokenCategory::Identifier | TokenCategory::Number | TokenCategory::Operator
        )
    };
    interchangeable(a) && interchangeable(b)
}

/// Append a token leaf to `target`, either folding its text into the
/// previous sibling's run or starting a new `m:r`.
///
/// Returns the data the next sibling needs for its own merge decision.
pub fn append_token(
    target: &mut XmlNode,
    element: &Element,
    category: TokenCategory,
    style: MathStyle,
    prev: Option<&PrevRun>,
) -> PrevRun {
    let text = element.flattened_text();
    let has_glyph = element.has_embedded_glyph();

    let mergeable = prev.is_some_and(|prev| {
        prev.style == style && same_bucket(prev.category, category) && !prev.has_glyph && !has_glyph
    });

    if mergeable && append_to_last_run(target, &text) {
        return PrevRun {
            style,
            category,
            has_glyph,
        };
    }

    let mut run = XmlNode::new("m:r");
    if let Some(props) = math_run_properties(&style, category, &text, has_glyph) {
        run.push(props);
    }
    if let Some(props) = word_run_properties(&style) {
        run.push(props);
    }
    run.push(XmlNode::new("m:t").text(text));
    target.push(run);

    PrevRun {
        style,
        category,
        has_glyph,
    }
}

/// Placeholder for an unrecognized construct; never fails the pipeline.
pub fn append_placeholder(target: &mut XmlNode) {
    target.push(XmlNode::new("m:r").child(XmlNode::new("m:t").text("\u{FFFD}")));
}

fn append_to_last_run(target: &mut XmlNode, text: &str) -> bool {
    let Some(run) = target.last_element_mut() else {
        return false;
    };
    if run.name != "m:r" {
        return false;
    }
    let Some(container) = run.last_element_mut() else {
        return false;
    };
    if container.name != "m:t" {
        return false;
    }
    match container.children.last_mut() {
        Some(XmlChild::Text(existing)) => existing.push_str(text),
        _ => container.push_text(text),
    }
    true
}

/// Select the `m:rPr` block: literal/plain style, no-style, or bold/italic
/// flags from the resolved variant.
fn math_run_properties(
    style: &MathStyle,
    category: TokenCategory,
    text: &str,
    has_glyph: bool,
) -> Option<XmlNode> {
    let plain = style.font_style == "normal"
        || category == TokenCategory::StringLiteral
        || (category == TokenCategory::Identifier
            && style.variant.is_none()
            && text.chars().count() > 1);
    if plain {
        return Some(XmlNode::new("m:rPr").child(XmlNode::new("m:sty").attr("m:val", "p")));
    }
    if has_glyph || category == TokenCategory::Text {
        return Some(XmlNode::new("m:rPr").child(XmlNode::new("m:nor")));
    }
    style.variant.map(|variant| {
        XmlNode::new("m:rPr").child(XmlNode::new("m:sty").attr("m:val", <&str>::from(variant)))
    })
}

fn word_run_properties(style: &MathStyle) -> Option<XmlNode> {
    let mut props = XmlNode::new("w:rPr");
    if !style.color.is_empty() {
        props.push(XmlNode::new("w:color").attr("w:val", style.color.trim_start_matches('#')));
    }
    if let Some(size) = super::style::half_points(&style.size) {
        props.push(XmlNode::new("w:sz").attr("w:val", size.to_string()));
    }
    if !style.background.is_empty() {
        props.push(
            XmlNode::new("w:shd")
                .attr("w:val", "clear")
                .attr("w:fill", style.background.trim_start_matches('#')),
        );
    }
    if props.is_empty() { None } else { Some(props) }
}
