use std::io::{Cursor, Read};

use docx_export::{DocumentNode, ExportError, export};
use zip::ZipArchive;

fn snapshot(json: &str) -> DocumentNode {
    serde_json::from_str(json).unwrap()
}

fn read_part(buffer: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(buffer)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

#[test]
fn exports_mixed_document_in_order() {
    let document = snapshot(
        r#"{"type":"root","children":[
            {"type":"heading","level":2,"children":[
                {"type":"text","text":"Results"}]},
            {"type":"paragraph","children":[
                {"type":"text","text":"Important","bold":true}]},
            {"type":"math","latex":"\\frac{1}{2}"},
            {"type":"table","children":[
                {"type":"table-row","children":[
                    {"type":"table-cell","children":[{"type":"text","text":"a"}]},
                    {"type":"table-cell","children":[{"type":"text","text":"b"}]}]},
                {"type":"table-row","children":[
                    {"type":"table-cell","children":[{"type":"text","text":"c"}]},
                    {"type":"table-cell","children":[{"type":"text","text":"d"}]}]}]}
        ]}"#,
    );
    let buffer = export(&document).unwrap();
    assert_eq!(&buffer[..4], b"PK\x03\x04");

    let body = read_part(&buffer, "word/document.xml").unwrap();

    // Four block elements, in input order.
    let heading = body.find(r#"<w:pStyle w:val="Heading2"/>"#).unwrap();
    let bold_run = body.find("<w:b/>").unwrap();
    let math = body.find("<m:oMathPara>").unwrap();
    let table = body.find("<w:tbl>").unwrap();
    assert!(heading < bold_run && bold_run < math && math < table, "{body}");

    // The fraction survived the whole pipeline.
    assert!(body.contains("<m:num><m:r><m:t>1</m:t></m:r></m:num>"), "{body}");
    assert!(body.contains("<m:den><m:r><m:t>2</m:t></m:r></m:den>"), "{body}");

    // 2 rows of 2 cells each.
    assert_eq!(body.matches("<w:tr>").count(), 2);
    assert_eq!(body.matches("<w:tc>").count(), 4);
}

#[test]
fn numbering_part_tracks_list_usage() {
    let without_lists = snapshot(r#"{"type":"root","children":[{"type":"paragraph","children":[]}]}"#);
    let buffer = export(&without_lists).unwrap();
    assert!(read_part(&buffer, "word/numbering.xml").is_none());

    let with_lists = snapshot(
        r#"{"type":"root","children":[
            {"type":"list-item","list":"number","list_id":5,"children":[
                {"type":"text","text":"first"}]},
            {"type":"list-item","list":"number","list_id":5,"children":[
                {"type":"text","text":"second"}]},
            {"type":"list-item","list":"bullet","list_id":6,"children":[
                {"type":"text","text":"other"}]}]}"#,
    );
    let buffer = export(&with_lists).unwrap();
    assert!(read_part(&buffer, "word/numbering.xml").is_some());

    let body = read_part(&buffer, "word/document.xml").unwrap();
    // Items of one list share a numId; the other list gets its own.
    assert_eq!(body.matches(r#"<w:numId w:val="1"/>"#).count(), 2, "{body}");
    assert_eq!(body.matches(r#"<w:numId w:val="2"/>"#).count(), 1, "{body}");
}

#[test]
fn ordered_list_value_becomes_start_override() {
    let document = snapshot(
        r#"{"type":"root","children":[
            {"type":"list-item","list":"number","list_id":1,"value":3,"children":[
                {"type":"text","text":"third"}]},
            {"type":"list-item","list":"number","list_id":1,"children":[
                {"type":"text","text":"fourth"}]}]}"#,
    );
    let buffer = export(&document).unwrap();
    let numbering = read_part(&buffer, "word/numbering.xml").unwrap();
    assert!(
        numbering.contains(
            r#"<w:lvlOverride w:ilvl="0"><w:startOverride w:val="3"/></w:lvlOverride>"#
        ),
        "{numbering}"
    );
}

#[test]
fn styles_part_always_present() {
    let document = snapshot(r#"{"type":"root","children":[]}"#);
    let buffer = export(&document).unwrap();
    let styles = read_part(&buffer, "word/styles.xml").unwrap();
    for id in ["Heading1", "Heading6", "Quote", "CodeBlock"] {
        assert!(styles.contains(id), "{id} missing");
    }
}

#[test]
fn image_media_parts_are_packaged() {
    // A 1x1 transparent png.
    let document = snapshot(
        r#"{"type":"root","children":[
            {"type":"image",
             "src":"data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
             "width":1,"height":1}]}"#,
    );
    let buffer = export(&document).unwrap();
    let rels = read_part(&buffer, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains("media/image1.png"), "{rels}");
    let mut archive = ZipArchive::new(Cursor::new(&buffer[..])).unwrap();
    assert!(archive.by_name("word/media/image1.png").is_ok());
}

#[test]
fn bad_image_uri_rejects_whole_export() {
    let document = snapshot(
        r#"{"type":"root","children":[
            {"type":"image","src":"http://example.com/x.png","width":1,"height":1}]}"#,
    );
    assert!(matches!(
        export(&document),
        Err(ExportError::InvalidDataUri(_))
    ));
}

#[test]
fn bad_latex_rejects_whole_export() {
    let document = snapshot(
        r#"{"type":"root","children":[{"type":"math","latex":"\\frac{"}]}"#,
    );
    assert!(matches!(export(&document), Err(ExportError::Latex(_))));
}

#[test]
fn export_is_deterministic_in_structure() {
    let document = snapshot(
        r#"{"type":"root","children":[
            {"type":"paragraph","children":[
                {"type":"text","text":"x"},
                {"type":"math","latex":"x^2","inline":true}]}]}"#,
    );
    let a = export(&document).unwrap();
    let b = export(&document).unwrap();
    assert_eq!(
        read_part(&a, "word/document.xml"),
        read_part(&b, "word/document.xml")
    );
}
