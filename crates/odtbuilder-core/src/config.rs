//! Builder configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! [uploads]
//! dir = "uploads"
//!
//! [images]
//! remote = true
//! timeout_secs = 10
//! max_bytes = 20971520
//! missing_marker = "[Afbeelding niet gevonden]"
//!
//! [output]
//! filename = "document.odt"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default failure-marker text for unresolvable images
pub const DEFAULT_MISSING_MARKER: &str = "[Afbeelding niet gevonden]";

/// Default attachment filename
pub const DEFAULT_FILENAME: &str = "document.odt";

/// Errors loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Upload store settings
    pub uploads: UploadSettings,
    /// Image resolution settings
    pub images: ImageSettings,
    /// Output settings
    pub output: OutputSettings,
}

impl BuilderConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Upload store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadSettings {
    /// Directory backing `/static/images/`
    pub dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

/// Image resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    /// Fetch http(s) sources
    pub remote: bool,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Largest accepted image
    pub max_bytes: usize,
    /// Text shown in place of an image that could not be resolved
    pub missing_marker: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            remote: true,
            timeout_secs: 10,
            max_bytes: 20 * 1024 * 1024,
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Attachment filename
    pub filename: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}
