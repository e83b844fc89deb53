//! One builder per MathML construct.
//!
//! Each builder either consumes its element (children included) and emits
//! the corresponding OMML fragment, or declines by returning
//! [`BuildOutcome::Recurse`] so the walker pours the children into the
//! current target. Arity violations always take the second path; a broken
//! construct degrades to its row content instead of failing the export.

use phf::phf_set;

use crate::xml::XmlNode;

use super::element::Element;
use super::walker::{BuildOutcome, fill_slot, stacked};

/// Glyphs that force `m:nary` layout instead of generic script nesting.
static NARY_GLYPHS: phf::Set<&'static str> = phf_set! {
    "∑", "∏", "∐", "⋀", "⋁", "⋂", "⋃",
    "⨀", "⨁", "⨂", "⨃", "⨄", "⨅", "⨆",
    "∫", "∬", "∭", "⨌", "∮", "∯", "∰", "∱", "∲", "∳",
};

const BAR_CHARS: [char; 5] = ['_', '¯', '‾', '\u{0305}', '\u{0332}'];

const GROUP_CHARS: [char; 10] = [
    '⏞', '⏟', '⎴', '⎵', '⏜', '⏝', '︷', '︸', '⏠', '⏡',
];

/// `mfrac` → `m:f`; `linethickness="0"` selects the no-bar type.
pub(crate) fn fraction(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
) -> BuildOutcome {
    let children: Vec<&Element> = element.element_children().collect();
    if children.len() != 2 {
        return BuildOutcome::Recurse;
    }
    let stack = stacked(element, ancestors);

    let mut frac = XmlNode::new("m:f");
    if element.attr("linethickness") == Some("0") {
        frac.push(XmlNode::new("m:fPr").child(XmlNode::new("m:type").attr("m:val", "noBar")));
    }
    let mut num = XmlNode::new("m:num");
    fill_slot(&mut num, &children[..1], &stack);
    frac.push(num);
    let mut den = XmlNode::new("m:den");
    fill_slot(&mut den, &children[1..], &stack);
    frac.push(den);

    target.push(frac);
    BuildOutcome::Handled(None)
}

/// `mroot`/`msqrt` → `m:rad`; the degree hides when its flattened text is
/// empty (always, for `msqrt`).
pub(crate) fn radical(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
) -> BuildOutcome {
    let children: Vec<&Element> = element.element_children().collect();
    let is_root = element.name == "mroot";
    if is_root && children.len() != 2 {
        return BuildOutcome::Recurse;
    }
    let stack = stacked(element, ancestors);

    let (base, degree): (&[&Element], &[&Element]) = if is_root {
        (&children[..1], &children[1..])
    } else {
        (&children[..], &[])
    };
    let deg_hidden = degree
        .first()
        .is_none_or(|deg| deg.flattened_text().is_empty());

    let mut rad = XmlNode::new("m:rad");
    if deg_hidden {
        rad.push(XmlNode::new("m:radPr").child(XmlNode::new("m:degHide").attr("m:val", "1")));
    }
    let mut deg = XmlNode::new("m:deg");
    if !deg_hidden {
        fill_slot(&mut deg, degree, &stack);
    }
    rad.push(deg);
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, base, &stack);
    rad.push(e);

    target.push(rad);
    BuildOutcome::Handled(None)
}

/// `msub`/`msup`/`msubsup` → `m:sSub`/`m:sSup`/`m:sSubSup`, or `m:nary`
/// when the base passes n-ary recognition.
pub(crate) fn scripts(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
) -> BuildOutcome {
    let children: Vec<&Element> = element.element_children().collect();
    let expected = if element.name == "msubsup" { 3 } else { 2 };
    if children.len() != expected {
        return BuildOutcome::Recurse;
    }
    let stack = stacked(element, ancestors);
    let base = children[0];

    let (sub, sup): (Option<&Element>, Option<&Element>) = match element.name.as_str() {
        "msub" => (Some(children[1]), None),
        "msup" => (None, Some(children[1])),
        _ => (Some(children[1]), Some(children[2])),
    };

    if let Some(glyph) = nary_glyph(base, element) {
        nary(target, &stack, glyph, sub, sup, "subSup");
        return BuildOutcome::Handled(None);
    }

    let name = match (sub, sup) {
        (Some(_), Some(_)) => "m:sSubSup",
        (Some(_), None) => "m:sSub",
        _ => "m:sSup",
    };
    let mut node = XmlNode::new(name);
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, &children[..1], &stack);
    node.push(e);
    if let Some(sub) = sub {
        let mut slot = XmlNode::new("m:sub");
        fill_slot(&mut slot, &[sub], &stack);
        node.push(slot);
    }
    if let Some(sup) = sup {
        let mut slot = XmlNode::new("m:sup");
        fill_slot(&mut slot, &[sup], &stack);
        node.push(slot);
    }

    target.push(node);
    BuildOutcome::Handled(None)
}

/// `munder`/`mover`/`munderover`, matched in priority order: n-ary, bar,
/// accent, group character, then the limit fallback.
pub(crate) fn under_over(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
) -> BuildOutcome {
    let children: Vec<&Element> = element.element_children().collect();
    let expected = if element.name == "munderover" { 3 } else { 2 };
    if children.len() != expected {
        return BuildOutcome::Recurse;
    }
    let stack = stacked(element, ancestors);
    let base = children[0];

    let (under, over): (Option<&Element>, Option<&Element>) = match element.name.as_str() {
        "munder" => (Some(children[1]), None),
        "mover" => (None, Some(children[1])),
        _ => (Some(children[1]), Some(children[2])),
    };

    if let Some(glyph) = nary_glyph(base, element) {
        nary(target, &stack, glyph, under, over, "undOvr");
        return BuildOutcome::Handled(None);
    }

    match (under, over) {
        (None, Some(over)) => {
            let node = match single_char(over) {
                Some(ch) if BAR_CHARS.contains(&ch) => bar("top", base, &stack),
                Some(ch) if element.attr("accent") == Some("true") || is_accent_char(ch) => {
                    accent(ch, base, &stack)
                }
                Some(ch) if GROUP_CHARS.contains(&ch) && base.name == "mrow" => {
                    group_chr(ch, "top", base, &stack)
                }
                _ => limit("m:limUpp", base, over, &stack),
            };
            target.push(node);
        }
        (Some(under), None) => {
            let node = match single_char(under) {
                Some(ch) if BAR_CHARS.contains(&ch) => bar("bot", base, &stack),
                Some(ch) if GROUP_CHARS.contains(&ch) && base.name == "mrow" => {
                    group_chr(ch, "bot", base, &stack)
                }
                _ => limit("m:limLow", base, under, &stack),
            };
            target.push(node);
        }
        (Some(under), Some(over)) => {
            // No single OMML shape takes both limits outside n-ary; nest.
            let lower = limit("m:limLow", base, under, &stack);
            let mut upper = XmlNode::new("m:limUpp");
            upper.push(XmlNode::new("m:e").child(lower));
            let mut lim = XmlNode::new("m:lim");
            fill_slot(&mut lim, &[over], &stack);
            upper.push(lim);
            target.push(upper);
        }
        // Unreachable by the arity check, but degrade rather than assert.
        (None, None) => return BuildOutcome::Recurse,
    }
    BuildOutcome::Handled(None)
}

/// `mmultiscripts`: postscript pairs wrap the base inside out, prescript
/// pairs (after the `mprescripts` divider) wrap the result in `m:sPre`.
/// A multiscripts node with no children disappears.
pub(crate) fn multiscripts(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
) -> BuildOutcome {
    let children: Vec<&Element> = element.element_children().collect();
    let Some((base, scripts)) = children.split_first() else {
        return BuildOutcome::Handled(None);
    };
    let stack = stacked(element, ancestors);

    let divider = scripts.iter().position(|child| child.name == "mprescripts");
    let (post, pre) = match divider {
        Some(index) => (&scripts[..index], &scripts[index + 1..]),
        None => (scripts, &[][..]),
    };

    let mut expr = XmlNode::new("m:e");
    fill_slot(&mut expr, &[base], &stack);

    for pair in post.chunks(2) {
        expr = wrap_script_pair(expr, pair, &stack, false);
    }
    for pair in pre.chunks(2) {
        expr = wrap_script_pair(expr, pair, &stack, true);
    }

    target.children.append(&mut expr.children);
    BuildOutcome::Handled(None)
}

fn wrap_script_pair(
    expr: XmlNode,
    pair: &[&Element],
    stack: &[&Element],
    prescript: bool,
) -> XmlNode {
    let slot_of = |index: usize| -> Option<&Element> {
        pair.get(index)
            .copied()
            .filter(|element| element.name != "none")
    };
    let sub = slot_of(0);
    let sup = slot_of(1);

    let name = match (prescript, sub.is_some(), sup.is_some()) {
        (_, false, false) => return expr,
        (true, _, _) => "m:sPre",
        (false, true, true) => "m:sSubSup",
        (false, true, false) => "m:sSub",
        (false, false, true) => "m:sSup",
    };

    let mut node = XmlNode::new(name);
    let mut slots = Vec::new();
    if let Some(sub) = sub {
        let mut slot = XmlNode::new("m:sub");
        fill_slot(&mut slot, &[sub], stack);
        slots.push(slot);
    }
    if let Some(sup) = sup {
        let mut slot = XmlNode::new("m:sup");
        fill_slot(&mut slot, &[sup], stack);
        slots.push(slot);
    }
    if prescript {
        // m:sPre takes its scripts before the base.
        for slot in slots {
            node.push(slot);
        }
        node.push(expr);
    } else {
        node.push(expr);
        for slot in slots {
            node.push(slot);
        }
    }

    let mut wrapper = XmlNode::new("m:e");
    wrapper.push(node);
    wrapper
}

/// N-ary recognition: the base's flattened text is one of the big-operator
/// glyphs and the construct does not declare itself an accent.
fn nary_glyph(base: &Element, construct: &Element) -> Option<&'static str> {
    if construct.attr("accent") == Some("true") || construct.attr("accentunder") == Some("true") {
        return None;
    }
    let text = base.flattened_text();
    NARY_GLYPHS.get_key(text.trim()).copied()
}

fn nary(
    target: &mut XmlNode,
    stack: &[&Element],
    glyph: &str,
    sub: Option<&Element>,
    sup: Option<&Element>,
    lim_loc: &str,
) {
    let mut props = XmlNode::new("m:naryPr")
        .child(XmlNode::new("m:chr").attr("m:val", glyph))
        .child(XmlNode::new("m:limLoc").attr("m:val", lim_loc));
    if sub.is_none() {
        props.push(XmlNode::new("m:subHide").attr("m:val", "1"));
    }
    if sup.is_none() {
        props.push(XmlNode::new("m:supHide").attr("m:val", "1"));
    }

    let mut node = XmlNode::new("m:nary");
    node.push(props);
    let mut sub_slot = XmlNode::new("m:sub");
    if let Some(sub) = sub {
        fill_slot(&mut sub_slot, &[sub], stack);
    }
    node.push(sub_slot);
    let mut sup_slot = XmlNode::new("m:sup");
    if let Some(sup) = sup {
        fill_slot(&mut sup_slot, &[sup], stack);
    }
    node.push(sup_slot);
    // The summand/integrand follows as ordinary siblings; the slot stays
    // empty here.
    node.push(XmlNode::new("m:e"));

    target.push(node);
}

fn bar(position: &str, base: &Element, stack: &[&Element]) -> XmlNode {
    let mut node = XmlNode::new("m:bar");
    node.push(XmlNode::new("m:barPr").child(XmlNode::new("m:pos").attr("m:val", position)));
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, &[base], stack);
    node.push(e);
    node
}

fn accent(ch: char, base: &Element, stack: &[&Element]) -> XmlNode {
    let mut node = XmlNode::new("m:acc");
    node.push(XmlNode::new("m:accPr").child(XmlNode::new("m:chr").attr("m:val", ch.to_string())));
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, &[base], stack);
    node.push(e);
    node
}

fn group_chr(ch: char, position: &str, base: &Element, stack: &[&Element]) -> XmlNode {
    let vert_jc = if position == "top" { "bot" } else { "top" };
    let mut node = XmlNode::new("m:groupChr");
    node.push(
        XmlNode::new("m:groupChrPr")
            .child(XmlNode::new("m:chr").attr("m:val", ch.to_string()))
            .child(XmlNode::new("m:pos").attr("m:val", position))
            .child(XmlNode::new("m:vertJc").attr("m:val", vert_jc)),
    );
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, &[base], stack);
    node.push(e);
    node
}

fn limit(name: &'static str, base: &Element, script: &Element, stack: &[&Element]) -> XmlNode {
    let mut node = XmlNode::new(name);
    let mut e = XmlNode::new("m:e");
    fill_slot(&mut e, &[base], stack);
    node.push(e);
    let mut lim = XmlNode::new("m:lim");
    fill_slot(&mut lim, &[script], stack);
    node.push(lim);
    node
}

fn single_char(element: &Element) -> Option<char> {
    let text = element.flattened_text();
    let mut chars = text.trim().chars();
    let first = chars.next()?;
    if chars.next().is_some() { None } else { Some(first) }
}

fn is_accent_char(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036F}')
        || matches!(
            ch,
            '^' | 'ˆ' | '~' | '˜' | '˙' | '¨' | '´' | '`' | 'ˇ' | '˘' | '→' | '⇀' | '↔' | '⃗'
        )
}
