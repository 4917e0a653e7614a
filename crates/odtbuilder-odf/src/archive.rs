//! Archive handling for ODF packages
//!
//! An ODF package is a ZIP archive of XML parts and resources. The
//! `mimetype` entry must be the first entry and must be stored uncompressed
//! so that the format can be sniffed from a fixed offset.

use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::error::Result;

/// Path of the mimetype entry
pub const MIMETYPE_PATH: &str = "mimetype";

/// Represents an unpacked ODF package
#[derive(Debug, Default)]
pub struct OdfArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl OdfArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// List all files in the archive
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    /// Number of files in the archive
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        // fixed timestamps keep the output a pure function of the parts
        let options = SimpleFileOptions::default().last_modified_time(DateTime::default());
        let stored = options.compression_method(CompressionMethod::Stored);
        let deflated = options.compression_method(CompressionMethod::Deflated);

        // mimetype first, uncompressed
        if let Some(mimetype) = self.files.get(MIMETYPE_PATH) {
            zip.start_file(MIMETYPE_PATH, stored)?;
            zip.write_all(mimetype)?;
        }

        // Sort keys for deterministic output
        let mut paths: Vec<_> = self
            .files
            .keys()
            .filter(|path| path.as_str() != MIMETYPE_PATH)
            .collect();
        paths.sort();

        for path in paths {
            zip.start_file(path.as_str(), deflated)?;
            zip.write_all(&self.files[path])?;
        }

        zip.finish()?;
        Ok(())
    }
}
