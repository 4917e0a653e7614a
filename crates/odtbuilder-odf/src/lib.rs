//! # odtbuilder-odf
//!
//! OpenDocument Text model and package writer for odtbuilder.
//!
//! This crate provides functionality to:
//! - Build a document model (headings, paragraphs, one-row tables, frames)
//! - Register named automatic styles and embedded pictures
//! - Serialize the model into a valid `.odt` package
//!
//! ## Example
//!
//! ```
//! use odtbuilder_odf::{Document, Element, OdtWriter, Paragraph, PageLayout};
//!
//! let mut doc = Document::new();
//! doc.init_page_layout(PageLayout::A4);
//! doc.push(Element::Paragraph(Paragraph::with_text("Beste gast,")));
//!
//! let bytes = OdtWriter::generate(&doc)?;
//! std::fs::write(std::env::temp_dir().join("doc.odt"), bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod document;
pub mod error;
pub mod manifest;
pub mod page;
pub mod resources;
pub mod styles;
pub mod writer;
pub mod xml;

pub use archive::{OdfArchive, MIMETYPE_PATH};
pub use document::{
    Document, Element, Frame, Heading, Inline, Paragraph, Table, TableCell, TableColumn, TableRow,
};
pub use error::{OdfError, Result};
pub use manifest::{Manifest, ManifestEntry, MANIFEST_PATH};
pub use page::{PageLayout, MASTER_PAGE_NAME, PAGE_LAYOUT_NAME};
pub use resources::{ImageFormat, ImageInfo, Resource, ResourceMark, Resources, PICTURES_DIR};
pub use styles::{
    style_name, CellProperties, ColumnProperties, ColumnWidth, FontStyle, FontWeight,
    GraphicProperties, ParagraphProperties, RegistryMark, RowProperties, Style, StyleFamily,
    StyleProperties, StyleRegistry, TableProperties, TextAlign, TextProperties,
};
pub use writer::{OdtWriter, DEFAULT_FONT, HEADING_STYLE, ODF_VERSION, ODT_MIMETYPE, STANDARD_STYLE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
