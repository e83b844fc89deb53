//! Recursive-descent driver over the MathML tree.
//!
//! For every element the walker looks up the pattern builder for its tag
//! and acts on the returned [`BuildOutcome`]: either the builder consumed
//! the subtree, or the walker pours the children into the current target
//! (containers, and any construct whose arity contract was violated).

use crate::xml::XmlNode;

use super::builders;
use super::element::Element;
use super::runs::{self, PrevRun, TokenCategory};
use super::style::{self, script_size};

/// What a pattern builder did with its element.
pub(crate) enum BuildOutcome {
    /// Children were not consumed; recurse into the current target.
    Recurse,
    /// The element and its children were emitted in full. Token builders
    /// hand back the run data the next sibling's merge decision needs.
    Handled(Option<PrevRun>),
}

/// Structural slots whose content renders at reduced script size.
const ARGUMENT_SLOTS: [&str; 7] = ["m:deg", "m:den", "m:num", "m:sub", "m:sup", "m:lim", "m:e"];

/// Walk the children of `element` into `target`.
///
/// The ancestor stack is extended (nearest-first) with `element` for the
/// duration of the descent; siblings are tracked for run merging.
pub fn walk_children(element: &Element, target: &mut XmlNode, ancestors: &[&Element]) {
    let stack = stacked(element, ancestors);
    walk_nodes(&element.element_children().collect::<Vec<_>>(), target, &stack);
}

/// Walk a sibling list into `target`, threading the previous run between
/// consecutive leaves.
pub(crate) fn walk_nodes(elements: &[&Element], target: &mut XmlNode, ancestors: &[&Element]) {
    let mut prev_run: Option<PrevRun> = None;
    for element in elements {
        match dispatch(element, target, ancestors, prev_run.as_ref()) {
            BuildOutcome::Recurse => {
                walk_children(element, target, ancestors);
                prev_run = None;
            }
            BuildOutcome::Handled(run) => prev_run = run,
        }
    }
}

/// Fill an argument-position slot with `content`.
///
/// Scriptlevel only matters when the slot has content, so the
/// argument-size properties are computed here, immediately before the
/// first child descends.
pub(crate) fn fill_slot(slot: &mut XmlNode, content: &[&Element], ancestors: &[&Element]) {
    let Some(first) = content.first() else {
        return;
    };
    if ARGUMENT_SLOTS.contains(&slot.name)
        && let Some(level) = script_size(style::inherited(first, ancestors, &["scriptlevel"]))
    {
        slot.push(
            XmlNode::new("m:argPr")
                .child(XmlNode::new("m:argSz").attr("m:val", (-level).to_string())),
        );
    }
    walk_nodes(content, slot, ancestors);
}

/// The ancestor stack seen by `element`'s children: nearest-first,
/// prepend-on-descend. A fresh vector per level keeps the input tree
/// immutable and the context strictly message-passing.
pub(crate) fn stacked<'a>(element: &'a Element, ancestors: &[&'a Element]) -> Vec<&'a Element> {
    let mut stack = Vec::with_capacity(ancestors.len() + 1);
    stack.push(element);
    stack.extend_from_slice(ancestors);
    stack
}

fn dispatch(
    element: &Element,
    target: &mut XmlNode,
    ancestors: &[&Element],
    prev_run: Option<&PrevRun>,
) -> BuildOutcome {
    if let Some(category) = TokenCategory::from_tag(&element.name) {
        let prev_variant = prev_run.and_then(|run| run.style.variant);
        let resolved = style::resolve(element, ancestors, category, prev_variant);
        let run = runs::append_token(target, element, category, resolved, prev_run);
        return BuildOutcome::Handled(Some(run));
    }

    match element.name.as_str() {
        "mfrac" => builders::fraction(element, target, ancestors),
        "msqrt" | "mroot" => builders::radical(element, target, ancestors),
        "msub" | "msup" | "msubsup" => builders::scripts(element, target, ancestors),
        "munder" | "mover" | "munderover" => builders::under_over(element, target, ancestors),
        "mmultiscripts" => builders::multiscripts(element, target, ancestors),
        // Pure containers: the target passes straight through.
        "math" | "root" | "mrow" | "mstyle" | "mpadded" | "mphantom" | "merror" | "semantics" => {
            BuildOutcome::Recurse
        }
        // Layout-only or marker elements with no OMML counterpart.
        "mspace" | "mprescripts" | "none" | "annotation" | "annotation-xml" => {
            BuildOutcome::Handled(None)
        }
        unknown => {
            log::warn!("no OMML pattern for MathML element `{unknown}`, emitting placeholder");
            runs::append_placeholder(target);
            BuildOutcome::Handled(None)
        }
    }
}
