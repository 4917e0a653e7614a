//! Embedded binary resources
//!
//! Images are stored under `Pictures/` in the package and referenced from
//! `draw:image` elements by that path. File names are derived from the
//! SHA-256 of the content, so the same picture used twice is stored once.
//!
//! # Format detection
//!
//! The editor does not tell us what kind of image a source points to, so
//! the format is guessed from the leading bytes with the `image` crate,
//! which also reads the pixel size from the header. SVG has no magic
//! number and is recognized by its root element.

use std::collections::HashMap;
use std::io::Cursor;

use image::ImageReader;
use sha2::{Digest, Sha256};

use crate::error::{OdfError, Result};

/// Folder for embedded pictures inside the package
pub const PICTURES_DIR: &str = "Pictures";

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Any raster format `image` recognizes
    Raster(image::ImageFormat),
    Svg,
    Unknown,
}

impl ImageFormat {
    /// Guess the format from magic bytes
    pub fn detect(data: &[u8]) -> Self {
        match image::guess_format(data) {
            Ok(format) => Self::Raster(format),
            Err(_) if looks_like_svg(data) => Self::Svg,
            Err(_) => Self::Unknown,
        }
    }

    /// File extension used inside the package
    pub fn extension(self) -> &'static str {
        match self {
            Self::Raster(format) => format.extensions_str().first().copied().unwrap_or("bin"),
            Self::Svg => "svg",
            Self::Unknown => "bin",
        }
    }

    /// MIME type recorded in the manifest
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Raster(format) => format.to_mime_type(),
            Self::Svg => "image/svg+xml",
            Self::Unknown => "application/octet-stream",
        }
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    match std::str::from_utf8(head) {
        Ok(text) => text.contains("<svg"),
        // a multi-byte character may be cut at the window edge
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()])
            .map(|text| text.contains("<svg"))
            .unwrap_or(false),
    }
}

/// Format and pixel size of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    /// Width and height in pixels, when the header could be read
    pub dimensions: Option<(u32, u32)>,
}

impl ImageInfo {
    /// Inspect image bytes
    pub fn inspect(data: &[u8]) -> Self {
        let format = ImageFormat::detect(data);
        let dimensions = match format {
            ImageFormat::Raster(_) => raster_dimensions(data),
            ImageFormat::Svg | ImageFormat::Unknown => None,
        }
        .filter(|(w, h)| *w > 0 && *h > 0);
        Self { format, dimensions }
    }

    /// Height divided by width, if known
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.dimensions.map(|(w, h)| h as f64 / w as f64)
    }
}

/// Read the pixel size from the image header without decoding pixels
fn raster_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format().ok()?;
    match reader.into_dimensions() {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            log::debug!("Could not read image header: {}", e);
            None
        }
    }
}

/// An embedded resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Path inside the package (e.g. `Pictures/3f2a....png`)
    pub path: String,
    pub media_type: &'static str,
    pub info: ImageInfo,
    pub data: Vec<u8>,
}

/// Position in a resource set, used to undo additions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMark(usize);

/// The embedded resources of one document
#[derive(Debug, Clone, Default)]
pub struct Resources {
    entries: Vec<Resource>,
    by_path: HashMap<String, usize>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed image bytes and return the stored resource
    ///
    /// Identical content is stored once; adding it again returns the
    /// existing entry.
    pub fn add_image(&mut self, data: Vec<u8>) -> Result<&Resource> {
        if data.is_empty() {
            return Err(OdfError::EmptyResource("image".to_string()));
        }

        let info = ImageInfo::inspect(&data);
        let path = format!(
            "{}/{}.{}",
            PICTURES_DIR,
            content_hash(&data),
            info.format.extension()
        );

        let index = match self.by_path.get(&path) {
            Some(&index) => index,
            None => {
                log::debug!("Embedding {} ({} bytes)", path, data.len());
                self.entries.push(Resource {
                    path: path.clone(),
                    media_type: info.format.mime_type(),
                    info,
                    data,
                });
                self.by_path.insert(path, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        Ok(&self.entries[index])
    }

    pub fn get(&self, path: &str) -> Option<&Resource> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remember the current state
    pub fn mark(&self) -> ResourceMark {
        ResourceMark(self.entries.len())
    }

    /// Drop every resource added after `mark`
    pub fn rollback(&mut self, mark: ResourceMark) {
        if mark.0 >= self.entries.len() {
            return;
        }
        for resource in self.entries.drain(mark.0..) {
            self.by_path.remove(&resource.path);
        }
    }
}

/// First 16 hex digits of the SHA-256 of `data`
fn content_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A real PNG of the given size
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encode(width, height, image::ImageFormat::Png)
    }

    fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut data = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut data), format)
            .unwrap();
        data
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            ImageFormat::detect(&png_bytes(1, 1)),
            ImageFormat::Raster(image::ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Raster(image::ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::detect(b"GIF89a\x01\x00\x01\x00"),
            ImageFormat::Raster(image::ImageFormat::Gif)
        );
        assert_eq!(
            ImageFormat::detect(b"<?xml version=\"1.0\"?><svg xmlns=\"x\"/>"),
            ImageFormat::Svg
        );
        assert_eq!(ImageFormat::detect(b"hello"), ImageFormat::Unknown);
    }

    #[test]
    fn test_extensions_and_mime_types() {
        let jpeg = ImageFormat::Raster(image::ImageFormat::Jpeg);
        assert_eq!(jpeg.extension(), "jpg");
        assert_eq!(jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(ImageFormat::Unknown.extension(), "bin");
    }

    #[test]
    fn test_png_dimensions() {
        let info = ImageInfo::inspect(&png_bytes(64, 48));
        assert_eq!(info.dimensions, Some((64, 48)));
        assert_eq!(info.aspect_ratio(), Some(0.75));
    }

    #[test]
    fn test_jpeg_dimensions() {
        let info = ImageInfo::inspect(&encode(30, 20, image::ImageFormat::Jpeg));
        assert_eq!(info.format, ImageFormat::Raster(image::ImageFormat::Jpeg));
        assert_eq!(info.dimensions, Some((30, 20)));
    }

    #[test]
    fn test_gif_dimensions() {
        let info = ImageInfo::inspect(&encode(32, 16, image::ImageFormat::Gif));
        assert_eq!(info.dimensions, Some((32, 16)));
    }

    #[test]
    fn test_truncated_headers_have_no_dimensions() {
        let info = ImageInfo::inspect(b"\x89PNG\r\n\x1a\n");
        assert_eq!(info.format, ImageFormat::Raster(image::ImageFormat::Png));
        assert_eq!(info.dimensions, None);
    }

    #[test]
    fn test_add_image_names_by_content() {
        let mut resources = Resources::new();
        let path = resources.add_image(png_bytes(2, 2)).unwrap().path.clone();
        assert!(path.starts_with("Pictures/"));
        assert!(path.ends_with(".png"));
        assert_eq!(path.len(), "Pictures/".len() + 16 + ".png".len());

        let again = resources.add_image(png_bytes(2, 2)).unwrap().path.clone();
        assert_eq!(path, again);
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_add_empty_image_fails() {
        let mut resources = Resources::new();
        assert!(matches!(
            resources.add_image(Vec::new()),
            Err(OdfError::EmptyResource(_))
        ));
        assert!(resources.is_empty());
    }

    #[test]
    fn test_rollback_keeps_earlier_entries() {
        let mut resources = Resources::new();
        let first = resources.add_image(png_bytes(1, 1)).unwrap().path.clone();
        let mark = resources.mark();
        resources.add_image(png_bytes(1, 1)).unwrap();
        let second = resources.add_image(png_bytes(3, 3)).unwrap().path.clone();

        resources.rollback(mark);

        assert!(resources.get(&first).is_some());
        assert!(resources.get(&second).is_none());
        assert_eq!(resources.len(), 1);
    }
}
