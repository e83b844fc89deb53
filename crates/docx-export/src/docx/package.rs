//! Package assembly: the fixed OOXML parts and the ZIP packer.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::document::DocumentNode;
use crate::docx::mapper::{self, MapContext};
use crate::docx::styles;
use crate::error::ExportError;
use crate::xml::{XmlNode, serialize_part};

const NS_WORDPROCESSING: &str =
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_MATH: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_DRAWING_WP: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Assemble the complete `.docx` package for a document snapshot.
pub fn assemble(document: &DocumentNode) -> Result<Vec<u8>, ExportError> {
    let mut ctx = MapContext::default();
    let body = mapper::build_body(document, &mut ctx)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let part = |writer: &mut ZipWriter<Cursor<Vec<u8>>>,
                    name: &str,
                    data: &[u8]|
     -> Result<(), ExportError> {
        writer.start_file(name, options)?;
        writer.write_all(data)?;
        Ok(())
    };

    part(
        &mut writer,
        "[Content_Types].xml",
        serialize_part(&content_types(&ctx)).as_bytes(),
    )?;
    part(
        &mut writer,
        "_rels/.rels",
        serialize_part(&package_relationships()).as_bytes(),
    )?;
    part(
        &mut writer,
        "word/document.xml",
        serialize_part(&document_xml(body)).as_bytes(),
    )?;
    part(
        &mut writer,
        "word/_rels/document.xml.rels",
        serialize_part(&document_relationships(&ctx)).as_bytes(),
    )?;
    part(
        &mut writer,
        "word/styles.xml",
        serialize_part(&styles::styles_xml()).as_bytes(),
    )?;
    if let Some(numbering) = ctx.numbering.numbering_xml() {
        part(
            &mut writer,
            "word/numbering.xml",
            serialize_part(&numbering).as_bytes(),
        )?;
    }
    for media in ctx.media.parts() {
        part(&mut writer, &format!("word/media/{}", media.name), &media.data)?;
    }

    Ok(writer.finish()?.into_inner())
}

fn content_types(ctx: &MapContext) -> XmlNode {
    let mut root = XmlNode::new("Types").attr(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/content-types",
    );
    let defaults = [
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("xml", "application/xml"),
        ("png", "image/png"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
    ];
    for (extension, content_type) in defaults {
        root.push(
            XmlNode::new("Default")
                .attr("Extension", extension)
                .attr("ContentType", content_type),
        );
    }
    // Media parts with extensions outside the static list still need a
    // declared content type, one default per distinct extension.
    let mut extra: Vec<(&str, &str)> = Vec::new();
    for media in ctx.media.parts() {
        let Some((_, extension)) = media.name.rsplit_once('.') else {
            continue;
        };
        if defaults.iter().any(|(known, _)| *known == extension)
            || extra.iter().any(|(seen, _)| *seen == extension)
        {
            continue;
        }
        extra.push((extension, &media.content_type));
    }
    for (extension, content_type) in extra {
        root.push(
            XmlNode::new("Default")
                .attr("Extension", extension.to_string())
                .attr("ContentType", content_type.to_string()),
        );
    }
    root.push(part_override(
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    ));
    root.push(part_override(
        "/word/styles.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
    ));
    if !ctx.numbering.is_empty() {
        root.push(part_override(
            "/word/numbering.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
        ));
    }
    root
}

fn part_override(part_name: &str, content_type: &str) -> XmlNode {
    XmlNode::new("Override")
        .attr("PartName", part_name.to_string())
        .attr("ContentType", content_type.to_string())
}

fn package_relationships() -> XmlNode {
    XmlNode::new("Relationships")
        .attr(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )
        .child(relationship("rId1", REL_OFFICE_DOCUMENT, "word/document.xml"))
}

fn document_relationships(ctx: &MapContext) -> XmlNode {
    let mut root = XmlNode::new("Relationships").attr(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    );
    root.push(relationship("rId1", REL_STYLES, "styles.xml"));
    if !ctx.numbering.is_empty() {
        root.push(relationship("rId2", REL_NUMBERING, "numbering.xml"));
    }
    for media in ctx.media.parts() {
        root.push(relationship(
            &media.rel_id,
            REL_IMAGE,
            &format!("media/{}", media.name),
        ));
    }
    root
}

fn relationship(id: &str, rel_type: &str, target: &str) -> XmlNode {
    XmlNode::new("Relationship")
        .attr("Id", id.to_string())
        .attr("Type", rel_type.to_string())
        .attr("Target", target.to_string())
}

fn document_xml(body_blocks: Vec<XmlNode>) -> XmlNode {
    let mut body = XmlNode::new("w:body");
    for block in body_blocks {
        body.push(block);
    }
    body.push(section_properties());

    XmlNode::new("w:document")
        .attr("xmlns:w", NS_WORDPROCESSING)
        .attr("xmlns:m", NS_MATH)
        .attr("xmlns:r", NS_RELATIONSHIPS)
        .attr("xmlns:wp", NS_DRAWING_WP)
        .child(body)
}

/// A4 portrait with one-inch margins.
fn section_properties() -> XmlNode {
    XmlNode::new("w:sectPr")
        .child(
            XmlNode::new("w:pgSz")
                .attr("w:w", "11906")
                .attr("w:h", "16838"),
        )
        .child(
            XmlNode::new("w:pgMar")
                .attr("w:top", "1440")
                .attr("w:right", "1440")
                .attr("w:bottom", "1440")
                .attr("w:left", "1440"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> DocumentNode {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn package_is_a_zip_with_core_parts() {
        let document = snapshot(
            r#"{"type":"root","children":[
                {"type":"paragraph","children":[{"type":"text","text":"hello"}]}]}"#,
        );
        let buffer = assemble(&document).unwrap();
        assert_eq!(&buffer[..4], b"PK\x03\x04");
        let text = String::from_utf8_lossy(&buffer);
        assert!(text.contains("word/document.xml"), "missing document part");
        assert!(text.contains("word/styles.xml"), "missing styles part");
        assert!(!text.contains("word/numbering.xml"), "unexpected numbering part");
    }

    #[test]
    fn numbering_part_appears_with_lists() {
        let document = snapshot(
            r#"{"type":"root","children":[
                {"type":"list-item","list":"bullet","list_id":1,
                 "children":[{"type":"text","text":"a"}]}]}"#,
        );
        let buffer = assemble(&document).unwrap();
        let text = String::from_utf8_lossy(&buffer);
        assert!(text.contains("word/numbering.xml"), "missing numbering part");
    }

    #[test]
    fn unlisted_media_extension_gets_content_type_default() {
        let mut ctx = MapContext::default();
        // Payload bytes are irrelevant here, only the declared type is.
        crate::docx::image::image_block(
            &mut ctx.media,
            "data:image/webp;base64,AAAA",
            1,
            1,
            None,
            Vec::new(),
        )
        .unwrap();
        assert_eq!(ctx.media.parts()[0].name, "image1.webp");
        let mut out = String::new();
        content_types(&ctx).write_to(&mut out);
        assert!(
            out.contains(r#"<Default Extension="webp" ContentType="image/webp"/>"#),
            "{out}"
        );
        // The static defaults stay deduplicated.
        assert_eq!(out.matches(r#"Extension="png""#).count(), 1, "{out}");
    }

    #[test]
    fn document_part_declares_namespaces() {
        let node = document_xml(Vec::new());
        let mut out = String::new();
        node.write_to(&mut out);
        for ns in ["xmlns:w", "xmlns:m", "xmlns:r", "xmlns:wp"] {
            assert!(out.contains(ns), "{ns} missing in {out}");
        }
        assert!(out.contains("<w:sectPr>"), "{out}");
    }
}
