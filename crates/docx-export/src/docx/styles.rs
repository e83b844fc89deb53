//! Style presets for `word/styles.xml` and the code token color table.

use phf::phf_map;

use crate::xml::XmlNode;

/// Heading sizes in half-points, levels 1 through 6.
const HEADING_SIZES: [u32; 6] = [48, 40, 36, 32, 28, 24];

const BODY_FONT: &str = "Calibri";
const MONO_FONT: &str = "Consolas";
const CODE_SHADING: &str = "F5F5F5";
const QUOTE_COLOR: &str = "666666";

/// Syntax highlight colors by token class, as resolved by the editor's
/// highlighter.
pub static TOKEN_COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "keyword" => "D73A49",
    "string" => "032F62",
    "comment" => "6A737D",
    "number" => "005CC5",
    "function" => "6F42C1",
    "type" => "22863A",
    "variable" => "E36209",
    "operator" => "D73A49",
    "constant" => "005CC5",
    "punctuation" => "24292E",
};

/// The color for a highlight token class, defaulting to plain text color.
pub fn token_color(class: &str) -> &'static str {
    TOKEN_COLORS.get(class).copied().unwrap_or("24292E")
}

/// The `word/styles.xml` root: document defaults plus the named styles
/// the mapper references.
pub fn styles_xml() -> XmlNode {
    let mut root = XmlNode::new("w:styles").attr(
        "xmlns:w",
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    );

    root.push(
        XmlNode::new("w:docDefaults").child(
            XmlNode::new("w:rPrDefault").child(
                XmlNode::new("w:rPr")
                    .child(
                        XmlNode::new("w:rFonts")
                            .attr("w:ascii", BODY_FONT)
                            .attr("w:hAnsi", BODY_FONT),
                    )
                    .child(XmlNode::new("w:sz").attr("w:val", "22")),
            ),
        ),
    );

    root.push(
        named_style("Normal", "Normal")
            .attr("w:default", "1")
            .child(XmlNode::new("w:qFormat")),
    );

    for (index, size) in HEADING_SIZES.iter().enumerate() {
        root.push(heading_style(index as u8 + 1, *size));
    }
    root.push(quote_style());
    root.push(code_block_style());

    root
}

fn named_style(id: &str, name: &str) -> XmlNode {
    XmlNode::new("w:style")
        .attr("w:type", "paragraph")
        .attr("w:styleId", id.to_string())
        .child(XmlNode::new("w:name").attr("w:val", name.to_string()))
}

fn heading_style(level: u8, size: u32) -> XmlNode {
    named_style(&format!("Heading{level}"), &format!("heading {level}"))
        .child(XmlNode::new("w:basedOn").attr("w:val", "Normal"))
        .child(
            XmlNode::new("w:pPr").child(
                XmlNode::new("w:spacing")
                    .attr("w:before", "240")
                    .attr("w:after", "120"),
            ),
        )
        .child(
            XmlNode::new("w:rPr")
                .child(XmlNode::new("w:b"))
                .child(XmlNode::new("w:sz").attr("w:val", size.to_string())),
        )
}

fn quote_style() -> XmlNode {
    named_style("Quote", "Quote")
        .child(XmlNode::new("w:basedOn").attr("w:val", "Normal"))
        .child(
            XmlNode::new("w:pPr")
                .child(
                    XmlNode::new("w:pBdr").child(
                        XmlNode::new("w:left")
                            .attr("w:val", "single")
                            .attr("w:sz", "12")
                            .attr("w:space", "8")
                            .attr("w:color", "CCCCCC"),
                    ),
                )
                .child(XmlNode::new("w:ind").attr("w:left", "360")),
        )
        .child(XmlNode::new("w:rPr").child(XmlNode::new("w:color").attr("w:val", QUOTE_COLOR)))
}

fn code_block_style() -> XmlNode {
    named_style("CodeBlock", "Code Block")
        .child(XmlNode::new("w:basedOn").attr("w:val", "Normal"))
        .child(
            XmlNode::new("w:pPr").child(
                XmlNode::new("w:shd")
                    .attr("w:val", "clear")
                    .attr("w:fill", CODE_SHADING),
            ),
        )
        .child(
            XmlNode::new("w:rPr")
                .child(
                    XmlNode::new("w:rFonts")
                        .attr("w:ascii", MONO_FONT)
                        .attr("w:hAnsi", MONO_FONT),
                )
                .child(XmlNode::new("w:sz").attr("w:val", "20")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_styles_present() {
        let mut out = String::new();
        styles_xml().write_to(&mut out);
        for id in [
            "Normal",
            "Heading1",
            "Heading2",
            "Heading3",
            "Heading4",
            "Heading5",
            "Heading6",
            "Quote",
            "CodeBlock",
        ] {
            assert!(out.contains(&format!(r#"w:styleId="{id}""#)), "{id}");
        }
    }

    #[test]
    fn heading_sizes_decrease() {
        let mut out = String::new();
        styles_xml().write_to(&mut out);
        let first = out.find(r#"<w:sz w:val="48"/>"#);
        let last = out.find(r#"<w:sz w:val="24"/>"#);
        assert!(first.is_some() && last.is_some() && first < last, "{out}");
    }

    #[test]
    fn token_color_lookup() {
        assert_eq!(token_color("keyword"), "D73A49");
        assert_eq!(token_color("no-such-class"), "24292E");
    }
}
