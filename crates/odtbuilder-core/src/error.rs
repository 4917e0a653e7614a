//! Error types for document builds

use odtbuilder_ast::TreeError;
use odtbuilder_odf::OdfError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort a document build
///
/// Failures of single nodes never show up here: the compiler logs them and
/// skips the node.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The payload could not be decoded (client error)
    #[error("Invalid payload: {0}")]
    Payload(#[from] TreeError),

    /// The finished document could not be packaged (server error)
    #[error("Failed to package document: {0}")]
    Package(#[source] OdfError),
}

impl BuildError {
    /// Whether the caller sent a bad request
    pub fn is_client_error(&self) -> bool {
        matches!(self, BuildError::Payload(_))
    }
}

/// Result type for document builds
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors from resolving an image source to bytes
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The source string is empty
    #[error("No image source given")]
    NoSource,

    /// No registered source handles this kind of reference
    #[error("Unsupported image source: {0}")]
    Unsupported(String),

    /// Upload store lookup failed
    #[error("Upload store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed data URI
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Base64 payload could not be decoded
    #[error("Base64 decoding failed: {0}")]
    Decode(#[from] base64::DecodeError),

    /// HTTP request error
    #[cfg(feature = "remote")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the image data failed
    #[error("Failed to read image data: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered with a non-success status
    #[error("Server returned status {0}")]
    Status(u16),

    /// Source produced no bytes
    #[error("Image source returned no data")]
    Empty,

    /// Image exceeds the configured size limit
    #[error("Image exceeds the size limit ({size} bytes read, limit is {max})")]
    TooLarge { size: usize, max: usize },
}
