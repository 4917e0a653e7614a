//! Package manifest (META-INF/manifest.xml)
//!
//! The manifest lists every part of the package with its media type. The
//! package root entry (`/`) carries the document's own media type.

use crate::xml::escape_attr;

/// Path of the manifest inside the package
pub const MANIFEST_PATH: &str = "META-INF/manifest.xml";

/// Manifest namespace
pub const MANIFEST_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// One `manifest:file-entry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// The package manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// ODF version of the package
    pub version: String,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create a manifest with the root entry for `media_type`
    pub fn new(version: impl Into<String>, media_type: impl Into<String>) -> Self {
        let mut manifest = Self {
            version: version.into(),
            entries: Vec::new(),
        };
        manifest.add("/", media_type);
        manifest
    }

    /// Add a file entry
    pub fn add(&mut self, full_path: impl Into<String>, media_type: impl Into<String>) {
        self.entries.push(ManifestEntry {
            full_path: full_path.into(),
            media_type: media_type.into(),
        });
    }

    /// Look up the entry for a path
    pub fn get(&self, full_path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.full_path == full_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<manifest:manifest xmlns:manifest=\"{}\" manifest:version=\"{}\">\n",
            MANIFEST_NS,
            escape_attr(&self.version)
        ));
        for entry in &self.entries {
            if entry.full_path == "/" {
                xml.push_str(&format!(
                    " <manifest:file-entry manifest:full-path=\"/\" manifest:version=\"{}\" manifest:media-type=\"{}\"/>\n",
                    escape_attr(&self.version),
                    escape_attr(&entry.media_type)
                ));
            } else {
                xml.push_str(&format!(
                    " <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"{}\"/>\n",
                    escape_attr(&entry.full_path),
                    escape_attr(&entry.media_type)
                ));
            }
        }
        xml.push_str("</manifest:manifest>\n");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_root_entry() {
        let manifest = Manifest::new("1.3", "application/vnd.oasis.opendocument.text");
        assert_eq!(manifest.len(), 1);
        assert_eq!(
            manifest.get("/").unwrap().media_type,
            "application/vnd.oasis.opendocument.text"
        );
    }

    #[test]
    fn test_to_xml_lists_entries() {
        let mut manifest = Manifest::new("1.3", "application/vnd.oasis.opendocument.text");
        manifest.add("content.xml", "text/xml");
        manifest.add("Pictures/a.png", "image/png");

        let xml = manifest.to_xml();
        assert!(xml.contains("manifest:full-path=\"/\" manifest:version=\"1.3\""));
        assert!(xml.contains("manifest:full-path=\"Pictures/a.png\" manifest:media-type=\"image/png\""));
    }
}
