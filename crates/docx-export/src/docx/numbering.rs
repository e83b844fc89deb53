//! List numbering definitions and the per-export registry.
//!
//! Every document list gets its own concrete `w:num` instance so that two
//! separate lists never share a counter; the instances point at one of
//! three abstract definitions (ordered, bullet, check). The ordered
//! definition rotates number formats across nesting depth, the bullet
//! definition rotates glyphs, and the check definition suppresses the
//! marker entirely (the checkbox glyph is a literal run on the item).

use rustc_hash::FxHashMap;

use crate::document::ListKind;
use crate::xml::XmlNode;

const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];
const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
const LEVELS: u32 = 9;

// Both rotations are indexed by depth % 3.
static_assertions::const_assert_eq!(ORDERED_FORMATS.len(), BULLET_GLYPHS.len());

fn abstract_id(kind: ListKind) -> u32 {
    match kind {
        ListKind::Number => 0,
        ListKind::Bullet => 1,
        ListKind::Check => 2,
    }
}

/// Allocates `w:numId` values per owning list, remembering which abstract
/// definitions the document actually uses.
#[derive(Debug, Default)]
pub struct NumberingRegistry {
    ids: FxHashMap<u64, u32>,
    // numId n (1-based) lives at instances[n - 1].
    instances: Vec<(ListKind, Option<u32>)>,
}

impl NumberingRegistry {
    /// The `w:numId` for the list identified by `list_id`, allocating one
    /// on first sight. `start` is the counter override carried by the
    /// list's first item; later items cannot change it.
    pub fn num_id(&mut self, list_id: u64, kind: ListKind, start: Option<u32>) -> u32 {
        if let Some(&id) = self.ids.get(&list_id) {
            return id;
        }
        // A start of 1 matches the level definition already.
        self.instances.push((kind, start.filter(|&start| start > 1)));
        let id = self.instances.len() as u32;
        self.ids.insert(list_id, id);
        id
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The `word/numbering.xml` root, or nothing when the document holds
    /// no lists.
    pub fn numbering_xml(&self) -> Option<XmlNode> {
        if self.is_empty() {
            return None;
        }
        let mut root = XmlNode::new("w:numbering").attr(
            "xmlns:w",
            "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
        );
        for kind in [ListKind::Number, ListKind::Bullet, ListKind::Check] {
            root.push(abstract_num(kind));
        }
        for (index, (kind, start)) in self.instances.iter().enumerate() {
            let mut num = XmlNode::new("w:num")
                .attr("w:numId", (index + 1).to_string())
                .child(
                    XmlNode::new("w:abstractNumId")
                        .attr("w:val", abstract_id(*kind).to_string()),
                );
            if let Some(start) = start {
                num.push(
                    XmlNode::new("w:lvlOverride")
                        .attr("w:ilvl", "0")
                        .child(XmlNode::new("w:startOverride").attr("w:val", start.to_string())),
                );
            }
            root.push(num);
        }
        Some(root)
    }
}

fn abstract_num(kind: ListKind) -> XmlNode {
    let mut node =
        XmlNode::new("w:abstractNum").attr("w:abstractNumId", abstract_id(kind).to_string());
    for level in 0..LEVELS {
        node.push(level_definition(kind, level));
    }
    node
}

fn level_definition(kind: ListKind, level: u32) -> XmlNode {
    let rotation = (level % 3) as usize;
    let (format, text) = match kind {
        ListKind::Number => (
            ORDERED_FORMATS[rotation],
            format!("%{}.", level + 1),
        ),
        ListKind::Bullet => ("bullet", BULLET_GLYPHS[rotation].to_string()),
        ListKind::Check => ("none", String::new()),
    };

    XmlNode::new("w:lvl")
        .attr("w:ilvl", level.to_string())
        .child(XmlNode::new("w:start").attr("w:val", "1"))
        .child(XmlNode::new("w:numFmt").attr("w:val", format))
        .child(XmlNode::new("w:lvlText").attr("w:val", text))
        .child(XmlNode::new("w:lvlJc").attr("w:val", "left"))
        .child(
            XmlNode::new("w:pPr").child(
                XmlNode::new("w:ind")
                    .attr("w:left", (720 * (level + 1)).to_string())
                    .attr("w:hanging", "360"),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_list_shares_num_id() {
        let mut registry = NumberingRegistry::default();
        let a = registry.num_id(7, ListKind::Number, None);
        let b = registry.num_id(7, ListKind::Number, None);
        let c = registry.num_id(8, ListKind::Bullet, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn start_override_comes_from_the_first_item() {
        let mut registry = NumberingRegistry::default();
        registry.num_id(1, ListKind::Number, Some(4));
        // A later override on the same list is ignored.
        registry.num_id(1, ListKind::Number, Some(9));
        registry.num_id(2, ListKind::Number, None);
        // Starting at 1 needs no override.
        registry.num_id(3, ListKind::Number, Some(1));
        let mut out = String::new();
        registry.numbering_xml().unwrap().write_to(&mut out);
        assert_eq!(out.matches("<w:lvlOverride ").count(), 1, "{out}");
        assert!(out.contains(r#"<w:startOverride w:val="4"/>"#), "{out}");
    }

    #[test]
    fn empty_registry_emits_nothing() {
        assert!(NumberingRegistry::default().numbering_xml().is_none());
    }

    #[test]
    fn numbering_part_structure() {
        let mut registry = NumberingRegistry::default();
        registry.num_id(1, ListKind::Number, None);
        registry.num_id(2, ListKind::Bullet, None);
        let mut out = String::new();
        registry.numbering_xml().unwrap().write_to(&mut out);
        assert_eq!(out.matches("<w:abstractNum ").count(), 3);
        assert_eq!(out.matches("<w:num ").count(), 2);
        // Format rotation across depth.
        assert!(out.contains(r#"<w:numFmt w:val="decimal"/>"#), "{out}");
        assert!(out.contains(r#"<w:numFmt w:val="lowerLetter"/>"#), "{out}");
        assert!(out.contains(r#"<w:numFmt w:val="lowerRoman"/>"#), "{out}");
        assert!(out.contains(r#"<w:lvlText w:val="•"/>"#), "{out}");
    }
}
