//! The document snapshot model.
//!
//! This mirrors the JSON the editor produces: a tree of tagged nodes with
//! ordered children and per-kind attributes. The exporter never mutates a
//! snapshot; everything it derives lives on the output tree.

use serde::Deserialize;
use strum_macros::IntoStaticStr;

/// Block alignment, serialized to the `w:jc` attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "center")]
    Center,
    #[strum(serialize = "right")]
    Right,
    #[strum(serialize = "both")]
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Number,
    Check,
}

/// One node of the document tree.
///
/// `children` is ordered; leaves leave it empty. Attribute fields default
/// so that snapshots only carry what the editor actually set.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DocumentNode {
    Heading {
        level: u8,
        #[serde(default)]
        align: Option<Alignment>,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    Paragraph {
        #[serde(default)]
        align: Option<Alignment>,
        #[serde(default)]
        indent: u32,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    Text {
        text: String,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
        #[serde(default)]
        underline: bool,
        #[serde(default)]
        strikethrough: bool,
        #[serde(default)]
        subscript: bool,
        #[serde(default)]
        superscript: bool,
        #[serde(default)]
        code: bool,
        #[serde(default)]
        highlight: bool,
        #[serde(default)]
        color: String,
        #[serde(default)]
        background: String,
        #[serde(default)]
        font_family: String,
        #[serde(default)]
        font_size: String,
    },
    ListItem {
        list: ListKind,
        /// Identity of the owning list; items of one list share this.
        list_id: u64,
        #[serde(default)]
        indent: u32,
        /// Counter start for ordered lists; read from the list's first item.
        #[serde(default)]
        value: Option<u32>,
        #[serde(default)]
        checked: Option<bool>,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    Table {
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    TableRow {
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    TableCell {
        #[serde(default)]
        col_span: Option<u32>,
        #[serde(default)]
        row_span: Option<u32>,
        /// Cell width in pixels.
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        background: String,
        #[serde(default)]
        vertical_text: bool,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    Image {
        /// `data:` URI with the encoded payload.
        src: String,
        width: u32,
        height: u32,
        /// Optional raster fallback payload for svg images, also a data URI.
        #[serde(default)]
        fallback: Option<String>,
        #[serde(default)]
        caption: Vec<DocumentNode>,
    },
    Math {
        latex: String,
        #[serde(default)]
        inline: bool,
    },
    Code {
        #[serde(default)]
        language: String,
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    CodeHighlight {
        text: String,
        #[serde(default)]
        token_class: String,
    },
    LineBreak,
    HorizontalRule,
    PageBreak,
    Quote {
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
    /// The snapshot root; a bare container around the top-level blocks.
    Root {
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
}

impl DocumentNode {
    pub fn children(&self) -> &[DocumentNode] {
        match self {
            DocumentNode::Heading { children, .. }
            | DocumentNode::Paragraph { children, .. }
            | DocumentNode::ListItem { children, .. }
            | DocumentNode::Table { children }
            | DocumentNode::TableRow { children }
            | DocumentNode::TableCell { children, .. }
            | DocumentNode::Code { children, .. }
            | DocumentNode::Quote { children }
            | DocumentNode::Root { children } => children,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_deserializes() {
        let json = r#"{
            "type": "root",
            "children": [
                {"type": "heading", "level": 2, "children": [
                    {"type": "text", "text": "Title"}
                ]},
                {"type": "paragraph", "align": "center", "children": [
                    {"type": "text", "text": "x", "bold": true},
                    {"type": "math", "latex": "\\frac{1}{2}", "inline": true}
                ]},
                {"type": "list-item", "list": "check", "list_id": 7, "checked": true}
            ]
        }"#;
        let root: DocumentNode = serde_json::from_str(json).unwrap();
        let children = root.children();
        assert_eq!(children.len(), 3);
        match &children[0] {
            DocumentNode::Heading { level, .. } => assert_eq!(*level, 2),
            other => panic!("expected heading, got {other:?}"),
        }
        match &children[1] {
            DocumentNode::Paragraph { align, .. } => {
                assert_eq!(*align, Some(Alignment::Center));
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn alignment_attribute_values() {
        let problems = [
            (Alignment::Left, "left"),
            (Alignment::Center, "center"),
            (Alignment::Right, "right"),
            (Alignment::Justify, "both"),
        ];
        for (align, expected) in problems {
            assert_eq!(<&str>::from(align), expected);
        }
    }
}
