//! odtbuilder CLI - Command-line interface library
//!
//! This library provides the CLI functionality for odtbuilder:
//! - Build: Convert an editor payload to an ODT file
//! - Upload: Store an image for use in payloads
//!
//! # Binary Usage
//!
//! ```bash
//! # Build a document
//! odtbuilder build payload.json --output brief.odt
//!
//! # Build without fetching remote images
//! odtbuilder build payload.json --offline --uploads ./uploads
//!
//! # Store an image; prints /static/images/<name>.png
//! odtbuilder upload logo.png --uploads ./uploads
//! ```

pub mod app;

// Re-export main entry point and commands
pub use app::{build_command, init_logging, load_config, run_cli, upload_command};
