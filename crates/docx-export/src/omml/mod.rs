//! MathML to Office Math (OMML) conversion.
//!
//! LaTeX source is first rendered to MathML by an external converter, then
//! compiled into an `m:oMath` element tree by a recursive walker with one
//! pattern builder per MathML construct. The input tree is never mutated;
//! resolved styles and sibling-run data travel through the call graph.

mod builders;
mod element;
mod runs;
pub(crate) mod style;
mod walker;

use latex2mathml::{DisplayStyle, latex_to_mathml};

use crate::error::ExportError;
use crate::xml::XmlNode;

pub use element::parse_mathml;

/// Compile MathML text into an `m:oMath` element.
pub fn convert_mathml(mathml: &str) -> Result<XmlNode, ExportError> {
    let root = element::parse_mathml(mathml)?;
    let mut omath = XmlNode::new("m:oMath");
    walker::walk_children(&root, &mut omath, &[]);
    Ok(omath)
}

/// Convert a LaTeX formula to an `m:oMath` element. `inline` selects
/// inline rendering (no display-style layout for large operators).
pub fn latex_to_omml(latex: &str, inline: bool) -> Result<XmlNode, ExportError> {
    let display = if inline {
        DisplayStyle::Inline
    } else {
        DisplayStyle::Block
    };
    let mathml =
        latex_to_mathml(latex, display).map_err(|error| ExportError::Latex(error.to_string()))?;
    // The converter writes operator characters like `<` unescaped.
    convert_mathml(&element::sanitize_markup(&mathml))
}
