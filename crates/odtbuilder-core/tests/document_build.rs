//! Document Build Tests
//!
//! End-to-end tests from JSON payload to packaged `.odt`, checking the
//! generated content.xml.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use odtbuilder_core::{
    BuilderConfig, DataUriSource, DocumentBuilder, ImageResolver, LocalUploadStore,
    UploadStoreSource,
};
use odtbuilder_odf::{Element, Inline, OdfArchive};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::json;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .unwrap();
    data
}

fn offline_builder() -> DocumentBuilder {
    let mut resolver = ImageResolver::empty();
    resolver.add_source(Box::new(DataUriSource));
    DocumentBuilder::with_resolver(BuilderConfig::default(), resolver)
}

fn render(payload: serde_json::Value) -> OdfArchive {
    let bytes = offline_builder()
        .render_json(&payload.to_string())
        .expect("render failed");
    OdfArchive::from_reader(Cursor::new(bytes)).expect("invalid package")
}

fn content(payload: serde_json::Value) -> String {
    render(payload).get_string("content.xml").unwrap()
}

fn node(kind: &str, props: serde_json::Value, nodes: &[&str]) -> serde_json::Value {
    json!({ "type": { "resolvedName": kind }, "props": props, "nodes": nodes })
}

/// Local names of every start/empty element inside office:text, in order
fn body_elements(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut in_body = false;
    let mut names = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "office:text" {
                    in_body = true;
                } else if in_body {
                    names.push(name);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"office:text" => in_body = false,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("content.xml is not well-formed: {}", e),
        }
    }
    names
}

#[test]
fn test_row_with_columns_becomes_table() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["row"]),
        "row": node("Rij", json!({ "gap": 1, "my": 2 }), &["c1", "c2", "c3"]),
        "c1": node("Kolom", json!({ "width": "25%" }), &["t1"]),
        "c2": node("Kolom", json!({ "width": "auto" }), &["t2"]),
        "c3": node("Kolom", json!({ "width": "auto" }), &[]),
        "t1": node("Tekst", json!({ "text": "links" }), &[]),
        "t2": node("Tekst", json!({ "text": "midden" }), &[])
    }));

    let elements = body_elements(&xml);
    assert_eq!(elements.iter().filter(|e| *e == "table:table").count(), 1);
    assert_eq!(elements.iter().filter(|e| *e == "table:table-column").count(), 3);
    assert_eq!(elements.iter().filter(|e| *e == "table:table-row").count(), 1);
    assert_eq!(elements.iter().filter(|e| *e == "table:table-cell").count(), 3);

    let left = xml.find("links").unwrap();
    let middle = xml.find("midden").unwrap();
    assert!(left < middle);
    assert!(xml.contains("style:column-width=\"4.25cm\""));
    assert!(xml.contains("<text:p/>"), "empty column gets an empty paragraph");
}

#[test]
fn test_row_without_columns_emits_nothing() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["row", "after"]),
        "row": node("Rij", json!({}), &["t"]),
        "t": node("Tekst", json!({ "text": "los" }), &[]),
        "after": node("GastInformatie", json!({}), &[])
    }));

    assert!(!xml.contains("<table:table"));
    assert!(!xml.contains("Tbl_row"));
    assert!(!xml.contains("los"));
    assert!(xml.contains("{{ $guest.firstname }}"));
}

#[test]
fn test_page_breaks_between_pages() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["p1", "p2", "p3"]),
        "p1": node("Pagina", json!({}), &["a"]),
        "p2": node("Pagina", json!({}), &["b"]),
        "p3": node("Pagina", json!({}), &["c"]),
        "a": node("Tekst", json!({ "text": "een" }), &[]),
        "b": node("Tekst", json!({ "text": "twee" }), &[]),
        "c": node("Tekst", json!({ "text": "drie" }), &[])
    }));

    assert_eq!(xml.matches("fo:break-before=\"page\"").count(), 2);
    assert!(!xml.contains("PB_p1"));

    let first = xml.find(">een<").unwrap();
    let break2 = xml.find("<text:p text:style-name=\"PB_p2\"/>").unwrap();
    let second = xml.find(">twee<").unwrap();
    let break3 = xml.find("<text:p text:style-name=\"PB_p3\"/>").unwrap();
    let third = xml.find(">drie<").unwrap();
    assert!(first < break2 && break2 < second && second < break3 && break3 < third);
}

#[test]
fn test_merge_field_default() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["g"]),
        "g": node("GastInformatie", json!({}), &[])
    }));
    assert!(xml.contains("<text:p>{{ $guest.firstname }}</text:p>"));
}

#[test]
fn test_unresolvable_image_gets_marker() {
    let archive = render(json!({
        "ROOT": node("Document", json!({}), &["before", "img", "after"]),
        "before": node("Titel", json!({ "text": "Boven" }), &[]),
        "img": node("Afbeelding", json!({ "src": "https://unreachable.invalid/x.png" }), &[]),
        "after": node("Tekst", json!({ "text": "Onder" }), &[])
    }));

    let xml = archive.get_string("content.xml").unwrap();
    body_elements(&xml);
    let marker = xml.find("[Afbeelding niet gevonden]").unwrap();
    assert!(xml.find("Boven").unwrap() < marker);
    assert!(marker < xml.find("Onder").unwrap());
    assert!(!xml.contains("<draw:frame"));
    assert!(archive.file_list().all(|p| !p.starts_with("Pictures/")));
}

#[test]
fn test_data_uri_image_is_embedded() {
    let src = format!("data:image/png;base64,{}", STANDARD.encode(png(400, 200)));
    let archive = render(json!({
        "ROOT": node("Document", json!({}), &["img"]),
        "img": node("Afbeelding", json!({ "src": src, "width": "50%" }), &[])
    }));

    let xml = archive.get_string("content.xml").unwrap();
    assert!(xml.contains("style:rel-width=\"50%\""));
    assert!(xml.contains("svg:width=\"8.5cm\" svg:height=\"4.25cm\""));
    assert!(xml.contains("text:anchor-type=\"as-char\""));

    let pictures: Vec<_> = archive
        .file_list()
        .filter(|p| p.starts_with("Pictures/"))
        .map(str::to_string)
        .collect();
    assert_eq!(pictures.len(), 1);
    assert!(pictures[0].ends_with(".png"));
    assert!(xml.contains(&format!("xlink:href=\"{}\"", pictures[0])));
}

#[test]
fn test_uploaded_image_is_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalUploadStore::new(dir.path());
    let path = store.save(&png(10, 10), "logo.png").unwrap();

    let mut resolver = ImageResolver::empty();
    resolver.add_source(Box::new(UploadStoreSource::new(store)));
    let builder = DocumentBuilder::with_resolver(BuilderConfig::default(), resolver);

    let payload = json!({
        "ROOT": node("Document", json!({}), &["img"]),
        "img": node("Afbeelding", json!({ "src": format!("http://localhost:8000{}", path), "width": "auto" }), &[])
    });
    let tree = odtbuilder_ast::NodeTree::from_value(payload).unwrap();
    let doc = builder.build(&tree);

    assert_eq!(doc.resources.len(), 1);
    let Element::Paragraph(para) = &doc.body[0] else {
        panic!("expected paragraph");
    };
    let [Inline::Frame(frame)] = &para.content[..] else {
        panic!("expected a single frame");
    };
    assert_eq!(frame.rel_width_pct, 100.0);
    assert_eq!(frame.width_cm, frame.height_cm);
}

#[test]
fn test_dangling_child_is_skipped() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["a", "ghost", "b"]),
        "a": node("Tekst", json!({ "text": "eerste" }), &[]),
        "b": node("Tekst", json!({ "text": "tweede" }), &[])
    }));

    let first = xml.find("eerste").unwrap();
    let second = xml.find("tweede").unwrap();
    assert!(first < second);
    assert_eq!(body_elements(&xml).iter().filter(|e| *e == "text:p").count(), 2);
}

#[test]
fn test_unknown_type_is_transparent() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["wrap"]),
        "wrap": node("Kaart", json!({ "text": "genegeerd" }), &["inner"]),
        "inner": node("Tekst", json!({ "text": "binnen" }), &[])
    }));
    assert!(xml.contains("binnen"));
    assert!(!xml.contains("genegeerd"));
}

#[test]
fn test_rich_text_in_heading() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["h"]),
        "h": node("Titel", json!({ "text": "Hallo<br>&lt;wereld&gt;&nbsp;&amp; meer" }), &[])
    }));
    assert!(xml.contains(
        "text:outline-level=\"1\">Hallo<text:line-break/>&lt;wereld&gt; &amp; meer</text:h>"
    ));
}

#[test]
fn test_double_encoded_envelope() {
    let inner = json!({
        "ROOT": node("Document", json!({}), &["g"]),
        "g": node("GastInformatie", json!({ "field": "lastname" }), &[])
    });
    let payload = json!({ "data": inner.to_string() });
    let xml = content(payload);
    assert!(xml.contains("{{ $guest.lastname }}"));
}

#[test]
fn test_styles_are_unique_per_node() {
    let xml = content(json!({
        "ROOT": node("Document", json!({}), &["a", "b"]),
        "a": node("Tekst", json!({ "text": "x" }), &[]),
        "b": node("Tekst", json!({ "text": "x" }), &[])
    }));
    assert!(xml.contains("style:name=\"P_a\""));
    assert!(xml.contains("style:name=\"P_b\""));
}
