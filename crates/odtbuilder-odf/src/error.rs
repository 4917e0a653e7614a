//! Error types for ODF operations

use thiserror::Error;

/// Errors that can occur while building or packaging a document
#[derive(Error, Debug)]
pub enum OdfError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required file not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// A style with this name is already registered
    #[error("Style already registered: {0}")]
    DuplicateStyle(String),

    /// Referenced style was never registered
    #[error("Style not found: {0}")]
    StyleNotFound(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Embedded resource has no content
    #[error("Empty resource: {0}")]
    EmptyResource(String),
}

/// Result type for ODF operations
pub type Result<T> = std::result::Result<T, OdfError>;
