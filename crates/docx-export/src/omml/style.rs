//! Effective presentation style for math nodes.
//!
//! Styles resolve against the node's own attributes first, then against
//! the nearest enclosing `mstyle` on the ancestor stack. The stack is
//! explicit and threaded through every recursive call; nothing global.

use strum_macros::IntoStaticStr;

use super::element::Element;
use super::runs::TokenCategory;

/// Bold/italic composition, serialized to the `m:sty` attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Variant {
    #[strum(serialize = "b")]
    Bold,
    #[strum(serialize = "i")]
    Italic,
    #[strum(serialize = "bi")]
    BoldItalic,
}

/// Resolved style of one math node. Two runs merge only when their
/// contexts compare equal field for field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MathStyle {
    pub color: String,
    pub variant: Option<Variant>,
    pub size: String,
    pub script_level: String,
    pub background: String,
    pub font_style: String,
}

/// Nearest-declaration lookup: the node's own attributes, then `mstyle`
/// ancestors nearest-first. Absent resolves to the empty string.
pub fn inherited<'a>(element: &'a Element, ancestors: &[&'a Element], names: &[&str]) -> &'a str {
    for name in names {
        if let Some(value) = element.attr(name) {
            return value;
        }
    }
    for ancestor in ancestors {
        if ancestor.name == "mstyle" {
            for name in names {
                if let Some(value) = ancestor.attr(name) {
                    return value;
                }
            }
        }
    }
    ""
}

/// Resolve the full style context of a token element.
///
/// `prev_variant` is the resolved variant of the previous merge-eligible
/// sibling, used by the italic-run continuation heuristic.
pub fn resolve(
    element: &Element,
    ancestors: &[&Element],
    category: TokenCategory,
    prev_variant: Option<Variant>,
) -> MathStyle {
    MathStyle {
        color: inherited(element, ancestors, &["mathcolor", "color"]).to_string(),
        variant: compose_variant(element, ancestors, category, prev_variant),
        size: inherited(element, ancestors, &["mathsize"]).to_string(),
        script_level: inherited(element, ancestors, &["scriptlevel"]).to_string(),
        background: inherited(element, ancestors, &["mathbackground", "background"]).to_string(),
        font_style: inherited(element, ancestors, &["fontstyle"]).to_string(),
    }
}

/// Variant override order: explicit own `mathvariant`, then
/// `fontweight`/`fontstyle` merged over an inherited `mathvariant`, then
/// the category heuristic.
fn compose_variant(
    element: &Element,
    ancestors: &[&Element],
    category: TokenCategory,
    prev_variant: Option<Variant>,
) -> Option<Variant> {
    if let Some(value) = element.attr("mathvariant") {
        return parse_variant(value);
    }

    let inherited_variant = parse_variant(inherited(element, ancestors, &["mathvariant"]));
    let mut bold = matches!(
        inherited_variant,
        Some(Variant::Bold) | Some(Variant::BoldItalic)
    );
    let mut italic = matches!(
        inherited_variant,
        Some(Variant::Italic) | Some(Variant::BoldItalic)
    );

    match inherited(element, ancestors, &["fontweight"]) {
        "bold" => bold = true,
        "normal" => bold = false,
        _ => {}
    }
    match inherited(element, ancestors, &["fontstyle"]) {
        "italic" => italic = true,
        "normal" => italic = false,
        _ => {}
    }

    let mut nulled = false;
    if italic && nulls_inherited_italic(category, &element.flattened_text()) {
        italic = false;
        nulled = true;
    }

    let mut variant = make_variant(bold, italic);

    // An italic run continues across adjacent identifier/number/operator
    // siblings unless this node explicitly dropped it.
    if variant.is_none()
        && !nulled
        && matches!(
            prev_variant,
            Some(Variant::Italic) | Some(Variant::BoldItalic)
        )
        && matches!(
            category,
            TokenCategory::Identifier | TokenCategory::Number | TokenCategory::Operator
        )
    {
        variant = Some(Variant::Italic);
    }

    variant
}

/// Multi-character identifiers (function names) and non-decimal numbers
/// render upright even under an inherited italic.
fn nulls_inherited_italic(category: TokenCategory, text: &str) -> bool {
    match category {
        TokenCategory::Identifier => text.chars().count() > 1,
        TokenCategory::Number => !text
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ','),
        _ => false,
    }
}

fn parse_variant(value: &str) -> Option<Variant> {
    let value = if value == "b-i" { "bold-italic" } else { value };
    let bold = value.contains("bold");
    let italic = value.contains("italic");
    make_variant(bold, italic)
}

fn make_variant(bold: bool, italic: bool) -> Option<Variant> {
    match (bold, italic) {
        (true, true) => Some(Variant::BoldItalic),
        (true, false) => Some(Variant::Bold),
        (false, true) => Some(Variant::Italic),
        (false, false) => None,
    }
}

/// Font size strings (`"12pt"`, `"16px"`) to half-points. Other units
/// and unparseable values resolve to nothing.
pub(crate) fn half_points(size: &str) -> Option<u32> {
    let size = size.trim();
    if let Some(points) = size.strip_suffix("pt") {
        let points: f64 = points.trim().parse().ok()?;
        return Some((points * 2.0).round() as u32);
    }
    if let Some(pixels) = size.strip_suffix("px") {
        let pixels: f64 = pixels.trim().parse().ok()?;
        return Some((pixels * 1.5).round() as u32);
    }
    None
}

/// Scriptlevel parsed as a (possibly signed) integer, for argument-size
/// run properties. Empty or unparseable resolves to nothing.
pub fn script_size(script_level: &str) -> Option<i32> {
    let level: i32 = script_level.trim().trim_start_matches('+').parse().ok()?;
    if level == 0 { None } else { Some(level) }
}
