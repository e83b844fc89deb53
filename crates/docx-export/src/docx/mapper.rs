//! Document node mapper and tree builder.
//!
//! Each node kind maps to its WordprocessingML shape; containers recurse
//! and attach the flattened child elements, except tables, whose mapper
//! owns the full subtree. Working state (numbering registry, media store)
//! lives on an explicit context, never on the input tree.

use crate::document::{DocumentNode, ListKind};
use crate::docx::image::{self, MediaStore};
use crate::docx::numbering::NumberingRegistry;
use crate::docx::styles;
use crate::error::ExportError;
use crate::omml;
use crate::omml::style::half_points;
use crate::xml::XmlNode;

const CHECKED_GLYPH: &str = "\u{2611} ";
const UNCHECKED_GLYPH: &str = "\u{2610} ";
const MONO_FONT: &str = "Consolas";
const CODE_SHADING: &str = "F5F5F5";

/// Per-export working state.
#[derive(Debug, Default)]
pub struct MapContext {
    pub numbering: NumberingRegistry,
    pub media: MediaStore,
}

/// Map the snapshot root into the body's block elements.
pub fn build_body(root: &DocumentNode, ctx: &mut MapContext) -> Result<Vec<XmlNode>, ExportError> {
    map_nodes(root.children(), ctx)
}

fn map_nodes(nodes: &[DocumentNode], ctx: &mut MapContext) -> Result<Vec<XmlNode>, ExportError> {
    let mut out = Vec::new();
    for node in nodes {
        out.extend(map_node(node, ctx)?);
    }
    Ok(out)
}

fn map_node(node: &DocumentNode, ctx: &mut MapContext) -> Result<Vec<XmlNode>, ExportError> {
    match node {
        DocumentNode::Root { children } => map_nodes(children, ctx),

        DocumentNode::Heading {
            level,
            align,
            children,
        } => {
            let level = (*level).clamp(1, 6);
            let mut props = XmlNode::new("w:pPr")
                .child(XmlNode::new("w:pStyle").attr("w:val", format!("Heading{level}")));
            if let Some(align) = align {
                props.push(XmlNode::new("w:jc").attr("w:val", <&str>::from(*align)));
            }
            Ok(vec![paragraph_with(props, map_nodes(children, ctx)?)])
        }

        DocumentNode::Paragraph {
            align,
            indent,
            children,
        } => {
            let mut props = XmlNode::new("w:pPr");
            if let Some(align) = align {
                props.push(XmlNode::new("w:jc").attr("w:val", <&str>::from(*align)));
            }
            if *indent > 0 {
                props.push(XmlNode::new("w:ind").attr("w:left", (720 * indent).to_string()));
            }
            Ok(vec![paragraph_with(props, map_nodes(children, ctx)?)])
        }

        DocumentNode::Text { .. } => Ok(vec![text_run(node)]),

        DocumentNode::ListItem {
            list,
            list_id,
            indent,
            value,
            checked,
            children,
        } => Ok(vec![list_item(
            *list, *list_id, *indent, *value, *checked, children, ctx,
        )?]),

        DocumentNode::Table { children } => Ok(vec![table(children, ctx)?]),
        // Row and cell nodes only occur under a table, whose mapper owns
        // them. Stray ones degrade to their content.
        DocumentNode::TableRow { children } | DocumentNode::TableCell { children, .. } => {
            map_nodes(children, ctx)
        }

        DocumentNode::Image {
            src,
            width,
            height,
            fallback,
            caption,
        } => {
            let caption = map_nodes(caption, ctx)?;
            let caption = wrap_loose_runs(caption);
            Ok(vec![image::image_block(
                &mut ctx.media,
                src,
                *width,
                *height,
                fallback.as_deref(),
                caption,
            )?])
        }

        DocumentNode::Math { latex, inline } => {
            let omath = omml::latex_to_omml(latex, *inline)?;
            if *inline {
                Ok(vec![omath])
            } else {
                Ok(vec![
                    XmlNode::new("w:p").child(XmlNode::new("m:oMathPara").child(omath)),
                ])
            }
        }

        DocumentNode::Code { children, .. } => {
            let props = XmlNode::new("w:pPr")
                .child(XmlNode::new("w:pStyle").attr("w:val", "CodeBlock"))
                .child(
                    XmlNode::new("w:shd")
                        .attr("w:val", "clear")
                        .attr("w:fill", CODE_SHADING),
                );
            Ok(vec![paragraph_with(props, map_nodes(children, ctx)?)])
        }

        DocumentNode::CodeHighlight { text, token_class } => {
            let props = XmlNode::new("w:rPr")
                .child(
                    XmlNode::new("w:rFonts")
                        .attr("w:ascii", MONO_FONT)
                        .attr("w:hAnsi", MONO_FONT),
                )
                .child(XmlNode::new("w:color").attr("w:val", styles::token_color(token_class)));
            Ok(vec![
                XmlNode::new("w:r")
                    .child(props)
                    .child(preserved_text(text)),
            ])
        }

        DocumentNode::LineBreak => Ok(vec![XmlNode::new("w:r").child(XmlNode::new("w:br"))]),

        DocumentNode::HorizontalRule => Ok(vec![XmlNode::new("w:p").child(
            XmlNode::new("w:pPr").child(
                XmlNode::new("w:pBdr").child(
                    XmlNode::new("w:bottom")
                        .attr("w:val", "single")
                        .attr("w:sz", "6")
                        .attr("w:space", "1")
                        .attr("w:color", "CCCCCC"),
                ),
            ),
        )]),

        DocumentNode::PageBreak => Ok(vec![XmlNode::new("w:p").child(
            XmlNode::new("w:r").child(XmlNode::new("w:br").attr("w:type", "page")),
        )]),

        DocumentNode::Quote { children } => {
            let blocks = map_nodes(children, ctx)?;
            let blocks = wrap_loose_runs(blocks);
            Ok(blocks
                .into_iter()
                .map(|mut block| {
                    if block.name == "w:p" {
                        style_paragraph(&mut block, "Quote");
                    }
                    block
                })
                .collect())
        }
    }
}

fn paragraph_with(props: XmlNode, children: Vec<XmlNode>) -> XmlNode {
    let mut paragraph = XmlNode::new("w:p");
    if !props.is_empty() {
        paragraph.push(props);
    }
    for child in children {
        paragraph.push(child);
    }
    paragraph
}

/// Prepend a `w:pStyle` onto an already-built paragraph.
fn style_paragraph(paragraph: &mut XmlNode, style_id: &str) {
    let style = XmlNode::new("w:pStyle").attr("w:val", style_id.to_string());
    match paragraph.children.first_mut() {
        Some(crate::xml::XmlChild::Node(props)) if props.name == "w:pPr" => {
            props.children.insert(0, crate::xml::XmlChild::Node(style));
        }
        _ => {
            let props = XmlNode::new("w:pPr").child(style);
            paragraph
                .children
                .insert(0, crate::xml::XmlChild::Node(props));
        }
    }
}

/// Containers that may hold bare inline runs (quotes, captions) wrap them
/// in a paragraph so the body only carries block elements.
fn wrap_loose_runs(blocks: Vec<XmlNode>) -> Vec<XmlNode> {
    let mut out: Vec<XmlNode> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if matches!(block.name, "w:r" | "m:oMath") {
            if let Some(last) = out.last_mut()
                && last.name == "w:p"
                && last.attrs.is_empty()
            {
                last.push(block);
                continue;
            }
            out.push(XmlNode::new("w:p").child(block));
        } else {
            out.push(block);
        }
    }
    out
}

fn list_item(
    kind: ListKind,
    list_id: u64,
    indent: u32,
    value: Option<u32>,
    checked: Option<bool>,
    children: &[DocumentNode],
    ctx: &mut MapContext,
) -> Result<XmlNode, ExportError> {
    // Only ordered lists have a counter to override.
    let start = if kind == ListKind::Number { value } else { None };
    let num_id = ctx.numbering.num_id(list_id, kind, start);
    let props = XmlNode::new("w:pPr").child(
        XmlNode::new("w:numPr")
            .child(XmlNode::new("w:ilvl").attr("w:val", indent.to_string()))
            .child(XmlNode::new("w:numId").attr("w:val", num_id.to_string())),
    );

    let mut content = map_nodes(children, ctx)?;
    if kind == ListKind::Check {
        let glyph = if checked == Some(true) {
            CHECKED_GLYPH
        } else {
            UNCHECKED_GLYPH
        };
        content.insert(0, XmlNode::new("w:r").child(preserved_text(glyph)));
    }
    Ok(paragraph_with(props, content))
}

fn table(rows: &[DocumentNode], ctx: &mut MapContext) -> Result<XmlNode, ExportError> {
    let mut node = XmlNode::new("w:tbl");
    node.push(
        XmlNode::new("w:tblPr")
            .child(
                XmlNode::new("w:tblW")
                    .attr("w:w", "0")
                    .attr("w:type", "auto"),
            )
            .child(table_borders()),
    );

    let columns = rows
        .iter()
        .find_map(|row| match row {
            DocumentNode::TableRow { children } => Some(children.len()),
            _ => None,
        })
        .unwrap_or(0);
    let mut grid = XmlNode::new("w:tblGrid");
    for _ in 0..columns {
        grid.push(XmlNode::new("w:gridCol"));
    }
    node.push(grid);

    for row in rows {
        let DocumentNode::TableRow { children } = row else {
            continue;
        };
        let mut tr = XmlNode::new("w:tr");
        for cell in children {
            tr.push(table_cell(cell, ctx)?);
        }
        node.push(tr);
    }
    Ok(node)
}

fn table_cell(cell: &DocumentNode, ctx: &mut MapContext) -> Result<XmlNode, ExportError> {
    let DocumentNode::TableCell {
        col_span,
        row_span,
        width,
        background,
        vertical_text,
        children,
    } = cell
    else {
        // Not a cell node; still produce a valid cell around its content.
        let content = wrap_loose_runs(map_node(cell, ctx)?);
        return Ok(filled_cell(XmlNode::new("w:tcPr"), content));
    };

    let mut props = XmlNode::new("w:tcPr");
    match width {
        Some(width) => props.push(
            XmlNode::new("w:tcW")
                .attr("w:w", (width * 15).to_string())
                .attr("w:type", "dxa"),
        ),
        None => props.push(XmlNode::new("w:tcW").attr("w:w", "0").attr("w:type", "auto")),
    }
    if let Some(span) = col_span
        && *span > 1
    {
        props.push(XmlNode::new("w:gridSpan").attr("w:val", span.to_string()));
    }
    if let Some(span) = row_span
        && *span > 1
    {
        props.push(XmlNode::new("w:vMerge").attr("w:val", "restart"));
    }
    if !background.is_empty() {
        props.push(
            XmlNode::new("w:shd")
                .attr("w:val", "clear")
                .attr("w:fill", background.trim_start_matches('#').to_string()),
        );
    }
    if *vertical_text {
        props.push(XmlNode::new("w:textDirection").attr("w:val", "btLr"));
    }

    let content = wrap_loose_runs(map_nodes(children, ctx)?);
    Ok(filled_cell(props, content))
}

/// A cell must contain at least one paragraph.
fn filled_cell(props: XmlNode, content: Vec<XmlNode>) -> XmlNode {
    let mut tc = XmlNode::new("w:tc");
    tc.push(props);
    if content.is_empty() {
        tc.push(XmlNode::new("w:p"));
    } else {
        for block in content {
            tc.push(block);
        }
    }
    tc
}

fn table_borders() -> XmlNode {
    let mut borders = XmlNode::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(
            XmlNode::new(side)
                .attr("w:val", "single")
                .attr("w:sz", "4")
                .attr("w:color", "auto"),
        );
    }
    borders
}

fn text_run(node: &DocumentNode) -> XmlNode {
    let DocumentNode::Text {
        text,
        bold,
        italic,
        underline,
        strikethrough,
        subscript,
        superscript,
        code,
        highlight,
        color,
        background,
        font_family,
        font_size,
    } = node
    else {
        return XmlNode::new("w:r");
    };

    let mut props = XmlNode::new("w:rPr");
    if *code {
        props.push(
            XmlNode::new("w:rFonts")
                .attr("w:ascii", MONO_FONT)
                .attr("w:hAnsi", MONO_FONT),
        );
    } else if !font_family.is_empty() {
        props.push(
            XmlNode::new("w:rFonts")
                .attr("w:ascii", font_family.clone())
                .attr("w:hAnsi", font_family.clone()),
        );
    }
    if *bold {
        props.push(XmlNode::new("w:b"));
    }
    if *italic {
        props.push(XmlNode::new("w:i"));
    }
    if *strikethrough {
        props.push(XmlNode::new("w:strike"));
    }
    if *underline {
        props.push(XmlNode::new("w:u").attr("w:val", "single"));
    }
    if !color.is_empty() {
        props.push(XmlNode::new("w:color").attr("w:val", color.trim_start_matches('#').to_string()));
    }
    if let Some(size) = half_points(font_size) {
        props.push(XmlNode::new("w:sz").attr("w:val", size.to_string()));
    }
    if *highlight {
        props.push(XmlNode::new("w:highlight").attr("w:val", "yellow"));
    }
    if *code {
        props.push(
            XmlNode::new("w:shd")
                .attr("w:val", "clear")
                .attr("w:fill", CODE_SHADING),
        );
    } else if !background.is_empty() {
        props.push(
            XmlNode::new("w:shd")
                .attr("w:val", "clear")
                .attr("w:fill", background.trim_start_matches('#').to_string()),
        );
    }
    if *subscript {
        props.push(XmlNode::new("w:vertAlign").attr("w:val", "subscript"));
    } else if *superscript {
        props.push(XmlNode::new("w:vertAlign").attr("w:val", "superscript"));
    }

    let mut run = XmlNode::new("w:r");
    if !props.is_empty() {
        run.push(props);
    }
    run.push(preserved_text(text));
    run
}

/// A `w:t` that keeps leading and trailing whitespace.
fn preserved_text(text: &str) -> XmlNode {
    XmlNode::new("w:t").attr("xml:space", "preserve").text(text)
}
