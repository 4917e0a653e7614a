//! Document assembly
//!
//! Ties the pieces together for one build:
//!
//! ```text
//! payload ─► NodeTree ─► Document (A4 layout, fresh styles) ─► compile ─► OdtWriter ─► bytes
//! ```
//!
//! A [`DocumentBuilder`] holds only read-only state (configuration and the
//! image resolver), so one instance can serve concurrent builds; every
//! build allocates its own document, style registry and traversal context.

use odtbuilder_ast::NodeTree;
use odtbuilder_odf::{Document, OdtWriter, PageLayout};

use crate::compiler::{compile, CompileOptions};
use crate::config::BuilderConfig;
use crate::error::{BuildError, Result};
use crate::image::ImageResolver;
use crate::store::LocalUploadStore;
use crate::transport::OdtExport;

/// Builds documents from page-builder payloads
pub struct DocumentBuilder {
    config: BuilderConfig,
    resolver: ImageResolver,
    options: CompileOptions,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl DocumentBuilder {
    /// Create a builder with the default image sources for `config`
    pub fn new(config: BuilderConfig) -> Self {
        let store = LocalUploadStore::new(config.uploads.dir.clone());
        let resolver = ImageResolver::new(store, &config.images);
        Self::with_resolver(config, resolver)
    }

    /// Create a builder with a custom image resolver
    pub fn with_resolver(config: BuilderConfig, resolver: ImageResolver) -> Self {
        let options = CompileOptions {
            missing_marker: config.images.missing_marker.clone(),
        };
        Self {
            config,
            resolver,
            options,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Compile a decoded tree into an in-memory document
    pub fn build(&self, tree: &NodeTree) -> Document {
        let mut document = Document::new();
        document.init_page_layout(PageLayout::A4);

        let context = compile(tree, &mut document, &self.resolver, &self.options);
        log::info!(
            "Built document: {} blocks, {} styles, {} images, {} pages",
            document.len(),
            document.styles.len(),
            document.resources.len(),
            context.pages()
        );
        document
    }

    /// Compile a decoded tree and package it
    pub fn render(&self, tree: &NodeTree) -> Result<Vec<u8>> {
        let document = self.build(tree);
        OdtWriter::generate(&document).map_err(BuildError::Package)
    }

    /// Decode a JSON payload, compile it and package it
    pub fn render_json(&self, payload: &str) -> Result<Vec<u8>> {
        let tree = NodeTree::from_json_str(payload)?;
        self.render(&tree)
    }

    /// Like [`render_json`](Self::render_json), paired with the configured filename
    pub fn export_json(&self, payload: &str) -> Result<OdtExport> {
        let bytes = self.render_json(payload)?;
        Ok(OdtExport::new(self.config.output.filename.clone(), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> DocumentBuilder {
        DocumentBuilder::with_resolver(BuilderConfig::default(), ImageResolver::empty())
    }

    #[test]
    fn test_payload_errors_are_client_errors() {
        let builder = offline();
        for payload in ["not json", "[1, 2]", "{\"a\": {}}"] {
            let err = builder.render_json(payload).unwrap_err();
            assert!(err.is_client_error(), "{} -> {}", payload, err);
        }
    }

    #[test]
    fn test_build_sets_a4_layout() {
        let tree = NodeTree::from_json_str(r#"{"ROOT": {"type": "Container", "nodes": []}}"#).unwrap();
        let doc = offline().build(&tree);
        assert_eq!(doc.page_layout, Some(PageLayout::A4));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_export_uses_configured_filename() {
        let mut config = BuilderConfig::default();
        config.output.filename = "brief.odt".to_string();
        let builder = DocumentBuilder::with_resolver(config, ImageResolver::empty());

        let export = builder
            .export_json(r#"{"ROOT": {"type": {"resolvedName": "Document"}, "nodes": []}}"#)
            .unwrap();
        assert_eq!(export.filename, "brief.odt");
        assert!(export.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_builder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentBuilder>();
    }
}
