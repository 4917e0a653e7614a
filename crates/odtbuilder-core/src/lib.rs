//! # odtbuilder-core
//!
//! Compiles page-builder node trees into OpenDocument Text files.
//!
//! This crate provides:
//! - The node compiler, which walks the tree and emits styled blocks
//! - Rich-text normalization of the editor's inline markup
//! - Image resolution from uploads, data URIs and remote URLs
//! - The local upload store used by the image upload endpoint
//!
//! ## Example
//!
//! ```
//! use odtbuilder_core::{BuilderConfig, DocumentBuilder};
//!
//! let payload = r#"{
//!     "ROOT": { "type": { "resolvedName": "Document" }, "nodes": ["title"] },
//!     "title": { "type": { "resolvedName": "Titel" }, "props": { "text": "Welkom" } }
//! }"#;
//!
//! let builder = DocumentBuilder::new(BuilderConfig::default());
//! let odt = builder.render_json(payload)?;
//! assert!(odt.starts_with(b"PK"));
//! # Ok::<(), odtbuilder_core::BuildError>(())
//! ```

pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod image;
pub mod richtext;
pub mod store;
pub mod transport;
pub mod units;

pub use builder::DocumentBuilder;
pub use compiler::{compile, merge_placeholder, CompileOptions, NodeCompiler};
pub use config::{BuilderConfig, ConfigError, ImageSettings, OutputSettings, UploadSettings};
pub use context::BuildContext;
pub use error::{BuildError, ResolveError, Result};
pub use image::{DataUriSource, ImageResolver, ImageSource, UploadStoreSource};
#[cfg(feature = "remote")]
pub use image::HttpSource;
pub use store::{LocalUploadStore, StoreError, STATIC_IMAGES_PREFIX};
pub use transport::{content_disposition, OdtExport, ODT_CONTENT_TYPE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
