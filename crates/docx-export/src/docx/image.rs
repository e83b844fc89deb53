//! Image embedding: data-URI decoding, the media part store, and the
//! DrawingML inline shape.
//!
//! Raster payloads embed directly. Svg payloads embed as an svg part
//! referenced through the svgBlip extension, with the optional raster
//! fallback as the base blip so that consumers without svg support still
//! render something.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ExportError;
use crate::xml::XmlNode;

/// One EMU per pixel at 96 dpi.
const EMU_PER_PIXEL: u32 = 9525;

const SVG_BLIP_EXT_URI: &str = "{96DAC541-7B7A-43D3-8B79-37D633B846F1}";

#[derive(Debug)]
pub struct MediaPart {
    /// Part name under `word/media/`.
    pub name: String,
    pub content_type: String,
    pub rel_id: String,
    pub data: Vec<u8>,
}

/// Collects decoded media payloads during mapping; the packer writes them
/// out as `word/media/*` parts.
#[derive(Debug, Default)]
pub struct MediaStore {
    parts: Vec<MediaPart>,
}

impl MediaStore {
    fn add(&mut self, mime: &str, data: Vec<u8>) -> String {
        let index = self.parts.len() + 1;
        // Media relationship ids start high so they never collide with
        // the fixed part relationships.
        let rel_id = format!("rId{}", 100 + index);
        let name = format!("image{index}.{}", extension(mime));
        self.parts.push(MediaPart {
            name,
            content_type: mime.to_string(),
            rel_id: rel_id.clone(),
            data,
        });
        rel_id
    }

    pub fn parts(&self) -> &[MediaPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn extension(mime: &str) -> String {
    match mime {
        "image/png" => "png".to_string(),
        "image/jpeg" => "jpeg".to_string(),
        "image/gif" => "gif".to_string(),
        "image/svg+xml" => "svg".to_string(),
        // Derive from the subtype so the packer can declare a matching
        // content-type default for the part.
        _ => {
            let subtype = mime.split('/').nth(1).unwrap_or_default();
            let clean: String = subtype
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect();
            if clean.is_empty() { "bin".to_string() } else { clean }
        }
    }
}

/// Decode a `data:<mime>;base64,<payload>` URI.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), ExportError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::InvalidDataUri(format!("missing data: scheme in {uri:.32}")))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ExportError::InvalidDataUri("missing ;base64, separator".to_string()))?;
    if mime.is_empty() || !mime.contains('/') {
        return Err(ExportError::InvalidDataUri(format!("bad MIME type {mime:?}")));
    }
    let data = BASE64.decode(payload)?;
    Ok((mime.to_string(), data))
}

/// Map an image node to its block element: a captioned one-column
/// sub-table, or a bare paragraph with a trailing vanished break.
pub fn image_block(
    store: &mut MediaStore,
    src: &str,
    width: u32,
    height: u32,
    fallback: Option<&str>,
    caption: Vec<XmlNode>,
) -> Result<XmlNode, ExportError> {
    let (mime, data) = parse_data_uri(src)?;

    let drawing = if mime == "image/svg+xml" {
        let svg_rel = store.add(&mime, data);
        let base_rel = match fallback {
            Some(fallback) => {
                let (fallback_mime, fallback_data) = parse_data_uri(fallback)?;
                store.add(&fallback_mime, fallback_data)
            }
            None => svg_rel.clone(),
        };
        inline_drawing(store.parts.len() as u32, width, height, &base_rel, Some(&svg_rel))
    } else {
        let rel = store.add(&mime, data);
        inline_drawing(store.parts.len() as u32, width, height, &rel, None)
    };

    let mut image_run = XmlNode::new("w:r");
    image_run.push(drawing);

    if caption.is_empty() {
        let mut paragraph = XmlNode::new("w:p");
        paragraph.push(image_run);
        // A hidden break keeps a caret position after the drawing.
        paragraph.push(
            XmlNode::new("w:r")
                .child(XmlNode::new("w:rPr").child(XmlNode::new("w:vanish")))
                .child(XmlNode::new("w:br")),
        );
        return Ok(paragraph);
    }

    Ok(caption_table(image_run, width, caption))
}

/// A borderless one-column table: image row above, caption row below.
fn caption_table(image_run: XmlNode, width: u32, caption: Vec<XmlNode>) -> XmlNode {
    let width_twips = (width * 15).to_string();
    let mut table = XmlNode::new("w:tbl");
    table.push(
        XmlNode::new("w:tblPr")
            .child(
                XmlNode::new("w:tblW")
                    .attr("w:w", width_twips.clone())
                    .attr("w:type", "dxa"),
            )
            .child(borderless()),
    );
    table.push(
        XmlNode::new("w:tblGrid").child(XmlNode::new("w:gridCol").attr("w:w", width_twips)),
    );

    table.push(
        XmlNode::new("w:tr").child(
            XmlNode::new("w:tc").child(
                XmlNode::new("w:p")
                    .child(XmlNode::new("w:pPr").child(XmlNode::new("w:jc").attr("w:val", "center")))
                    .child(image_run),
            ),
        ),
    );

    let mut caption_cell = XmlNode::new("w:tc");
    for mut block in caption {
        if block.name == "w:p" {
            block
                .children
                .insert(0, crate::xml::XmlChild::Node(caption_paragraph_props()));
        }
        caption_cell.push(block);
    }
    table.push(XmlNode::new("w:tr").child(caption_cell));

    table
}

fn caption_paragraph_props() -> XmlNode {
    XmlNode::new("w:pPr").child(XmlNode::new("w:jc").attr("w:val", "center"))
}

fn borderless() -> XmlNode {
    let mut borders = XmlNode::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(XmlNode::new(side).attr("w:val", "none"));
    }
    borders
}

fn inline_drawing(
    id: u32,
    width: u32,
    height: u32,
    base_rel: &str,
    svg_rel: Option<&str>,
) -> XmlNode {
    let cx = (width * EMU_PER_PIXEL).to_string();
    let cy = (height * EMU_PER_PIXEL).to_string();
    let name = format!("Image {id}");

    let mut blip = XmlNode::new("a:blip").attr("r:embed", base_rel);
    if let Some(svg_rel) = svg_rel {
        blip.push(
            XmlNode::new("a:extLst").child(
                XmlNode::new("a:ext").attr("uri", SVG_BLIP_EXT_URI).child(
                    XmlNode::new("asvg:svgBlip")
                        .attr(
                            "xmlns:asvg",
                            "http://schemas.microsoft.com/office/drawing/2016/SVG/main",
                        )
                        .attr("r:embed", svg_rel),
                ),
            ),
        );
    }

    let pic = XmlNode::new("pic:pic")
        .attr(
            "xmlns:pic",
            "http://schemas.openxmlformats.org/drawingml/2006/picture",
        )
        .child(
            XmlNode::new("pic:nvPicPr")
                .child(
                    XmlNode::new("pic:cNvPr")
                        .attr("id", id.to_string())
                        .attr("name", name.clone()),
                )
                .child(XmlNode::new("pic:cNvPicPr")),
        )
        .child(
            XmlNode::new("pic:blipFill")
                .child(blip)
                .child(XmlNode::new("a:stretch").child(XmlNode::new("a:fillRect"))),
        )
        .child(
            XmlNode::new("pic:spPr")
                .child(
                    XmlNode::new("a:xfrm")
                        .child(XmlNode::new("a:off").attr("x", "0").attr("y", "0"))
                        .child(XmlNode::new("a:ext").attr("cx", cx.clone()).attr("cy", cy.clone())),
                )
                .child(
                    XmlNode::new("a:prstGeom")
                        .attr("prst", "rect")
                        .child(XmlNode::new("a:avLst")),
                ),
        );

    XmlNode::new("w:drawing").child(
        XmlNode::new("wp:inline")
            .child(XmlNode::new("wp:extent").attr("cx", cx).attr("cy", cy))
            .child(
                XmlNode::new("wp:docPr")
                    .attr("id", id.to_string())
                    .attr("name", name),
            )
            .child(
                XmlNode::new("a:graphic")
                    .attr(
                        "xmlns:a",
                        "http://schemas.openxmlformats.org/drawingml/2006/main",
                    )
                    .child(
                        XmlNode::new("a:graphicData")
                            .attr(
                                "uri",
                                "http://schemas.openxmlformats.org/drawingml/2006/picture",
                            )
                            .child(pic),
                    ),
            ),
    )
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;

    // A 1x1 transparent png.
    const PNG_URI: &str = "data:image/png;base64,\
        iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn data_uri_roundtrip() {
        let (mime, data) = parse_data_uri(PNG_URI).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn rejected_data_uris() {
        let problems = [
            "http://example.com/image.png",
            "data:image/png,rawpayload",
            "data:;base64,aGk=",
        ];
        for uri in problems {
            assert!(
                matches!(parse_data_uri(uri), Err(ExportError::InvalidDataUri(_))),
                "{uri}"
            );
        }
        assert!(matches!(
            parse_data_uri("data:image/png;base64,not!!base64"),
            Err(ExportError::ImageDecode(_))
        ));
    }

    #[test]
    fn captionless_image_gets_vanished_break() {
        let mut store = MediaStore::default();
        let block = image_block(&mut store, PNG_URI, 100, 50, None, Vec::new()).unwrap();
        let mut out = String::new();
        block.write_to(&mut out);
        assert_eq!(block.name, "w:p");
        assert!(out.contains("<w:vanish/>"), "{out}");
        assert!(out.contains(r#"<wp:extent cx="952500" cy="476250"/>"#), "{out}");
        assert_eq!(store.parts().len(), 1);
        assert_eq!(store.parts()[0].name, "image1.png");
    }

    #[test]
    fn caption_wraps_in_table() {
        let mut store = MediaStore::default();
        let caption = vec![XmlNode::new("w:p").child(
            XmlNode::new("w:r").child(XmlNode::new("w:t").text("Figure 1")),
        )];
        let block = image_block(&mut store, PNG_URI, 100, 50, None, caption).unwrap();
        assert_eq!(block.name, "w:tbl");
        let mut out = String::new();
        block.write_to(&mut out);
        assert_eq!(out.matches("<w:tr>").count(), 2, "{out}");
        assert!(out.contains("Figure 1"), "{out}");
    }

    #[test]
    fn svg_embeds_fallback_and_svg_blip() {
        let svg = format!(
            "data:image/svg+xml;base64,{}",
            BASE64.encode("<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
        );
        let mut store = MediaStore::default();
        let block =
            image_block(&mut store, &svg, 10, 10, Some(PNG_URI), Vec::new()).unwrap();
        let mut out = String::new();
        block.write_to(&mut out);
        assert!(out.contains("asvg:svgBlip"), "{out}");
        assert_eq!(store.parts().len(), 2);
        assert_eq!(store.parts()[0].content_type, "image/svg+xml");
        assert_eq!(store.parts()[1].content_type, "image/png");
        // The base blip is the raster fallback.
        assert!(
            out.contains(&format!(r#"<a:blip r:embed="{}""#, store.parts()[1].rel_id)),
            "{out}"
        );
    }
}
