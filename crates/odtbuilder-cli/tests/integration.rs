//! Integration tests for the odtbuilder CLI
//!
//! These run the build and upload commands against temporary directories
//! and inspect the written packages.

use std::fs;
use std::io::Read;
use std::path::Path;

use odtbuilder_cli::{build_command, load_config, upload_command};
use serde_json::json;
use tempfile::TempDir;
use zip::ZipArchive;

fn node(kind: &str, props: serde_json::Value, nodes: &[&str]) -> serde_json::Value {
    json!({ "type": { "resolvedName": kind }, "props": props, "nodes": nodes })
}

fn write_payload(dir: &Path, payload: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("payload.json");
    fs::write(&path, payload.to_string()).unwrap();
    path
}

fn read_entry(path: &Path, name: &str) -> String {
    let file = fs::File::open(path).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

fn entry_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect()
}

fn png() -> Vec<u8> {
    let mut data = Vec::new();
    image::RgbImage::new(32, 16)
        .write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Png)
        .unwrap();
    data
}

#[test]
fn test_build_writes_odt_package() {
    let temp = TempDir::new().unwrap();
    let input = write_payload(
        temp.path(),
        &json!({
            "ROOT": node("Document", json!({}), &["title", "body", "guest"]),
            "title": node("Titel", json!({ "text": "Uitnodiging" }), &[]),
            "body": node("Tekst", json!({ "text": "Welkom op ons feest" }), &[]),
            "guest": node("GastInformatie", json!({ "field": "firstname" }), &[])
        }),
    );
    let output = temp.path().join("out").join("brief.odt");

    let written = build_command(&input, Some(&output), None, None, true).unwrap();
    assert_eq!(written, output);
    assert!(output.exists());

    let names = entry_names(&output);
    assert_eq!(names[0], "mimetype");
    assert!(names.contains(&"content.xml".to_string()));
    assert!(names.contains(&"META-INF/manifest.xml".to_string()));

    let content = read_entry(&output, "content.xml");
    assert!(content.contains("Uitnodiging"));
    assert!(content.contains("Welkom op ons feest"));
    assert!(content.contains("{{ $guest.firstname }}"));
}

#[test]
fn test_build_uses_configured_filename() {
    let temp = TempDir::new().unwrap();
    let input = write_payload(
        temp.path(),
        &json!({ "ROOT": node("Document", json!({}), &[]) }),
    );
    let target = temp.path().join("configured.odt");
    let config = temp.path().join("odtbuilder.toml");
    fs::write(
        &config,
        format!("[output]\nfilename = {:?}\n", target.display().to_string()),
    )
    .unwrap();

    let written = build_command(&input, None, Some(&config), None, true).unwrap();
    assert_eq!(written, target);
    assert!(target.exists());
}

#[test]
fn test_build_offline_marks_remote_images() {
    let temp = TempDir::new().unwrap();
    let input = write_payload(
        temp.path(),
        &json!({
            "ROOT": node("Document", json!({}), &["img"]),
            "img": node("Afbeelding", json!({ "src": "https://example.com/foto.png" }), &[])
        }),
    );
    let output = temp.path().join("offline.odt");

    build_command(&input, Some(&output), None, None, true).unwrap();

    let content = read_entry(&output, "content.xml");
    assert!(content.contains("[Afbeelding niet gevonden]"));
    assert!(entry_names(&output).iter().all(|n| !n.starts_with("Pictures/")));
}

#[test]
fn test_upload_then_build_embeds_image() {
    let temp = TempDir::new().unwrap();
    let uploads = temp.path().join("uploads");
    let image = temp.path().join("Logo.PNG");
    fs::write(&image, png()).unwrap();

    let static_path = upload_command(&image, Some(&uploads), None).unwrap();
    assert!(static_path.starts_with("/static/images/"));
    assert!(static_path.ends_with(".png"));

    let input = write_payload(
        temp.path(),
        &json!({
            "ROOT": node("Document", json!({}), &["img"]),
            "img": node("Afbeelding", json!({ "src": static_path }), &[])
        }),
    );
    let output = temp.path().join("with-image.odt");
    build_command(&input, Some(&output), None, Some(&uploads), true).unwrap();

    let pictures: Vec<_> = entry_names(&output)
        .into_iter()
        .filter(|n| n.starts_with("Pictures/"))
        .collect();
    assert_eq!(pictures.len(), 1);

    let manifest = read_entry(&output, "META-INF/manifest.xml");
    assert!(manifest.contains(&pictures[0]));
}

#[test]
fn test_build_rejects_invalid_payload() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();
    let output = temp.path().join("never.odt");

    let err = build_command(&input, Some(&output), None, None, true).unwrap_err();
    assert!(err.to_string().contains("Invalid payload"));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_file() {
    let temp = TempDir::new().unwrap();
    let result = build_command(&temp.path().join("absent.json"), None, None, None, true);
    assert!(result.is_err());
}

#[test]
fn test_upload_missing_image() {
    let temp = TempDir::new().unwrap();
    let result = upload_command(&temp.path().join("absent.png"), Some(temp.path()), None);
    assert!(result.is_err());
}

#[test]
fn test_load_config_defaults_and_errors() {
    let config = load_config(None).unwrap();
    assert_eq!(config.output.filename, "document.odt");

    let temp = TempDir::new().unwrap();
    let bad = temp.path().join("bad.toml");
    fs::write(&bad, "[images\nremote = ").unwrap();
    assert!(load_config(Some(&bad)).is_err());
}
