//! Local upload store
//!
//! Uploaded images are written to one directory under collision-free
//! random names and served by the HTTP layer as `/static/images/<name>`.
//! The image resolver reads them back through [`LocalUploadStore::read`].

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL path prefix under which uploads are served
pub const STATIC_IMAGES_PREFIX: &str = "/static/images/";

/// Extension used when the original filename has none
const DEFAULT_EXTENSION: &str = "bin";

/// Errors from the upload store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference is not under the static image prefix
    #[error("Not an upload path: {0}")]
    NotStatic(String),

    /// Reference names no plain file inside the store
    #[error("Invalid upload name: {0}")]
    InvalidName(String),
}

/// Upload store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    root: PathBuf,
}

impl LocalUploadStore {
    /// Create a store rooted at `root` (created on first save)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an upload and return its static path
    ///
    /// The stored name is a random UUID plus the lower-cased extension of
    /// `original_name`, so concurrent uploads never overwrite each other.
    pub fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, StoreError> {
        std::fs::create_dir_all(&self.root)?;

        let name = format!("{}.{}", Uuid::new_v4(), extension_of(original_name));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(&name))?;
        file.write_all(bytes)?;

        log::info!("Stored upload {} ({} bytes) as {}", original_name, bytes.len(), name);
        Ok(format!("{}{}", STATIC_IMAGES_PREFIX, name))
    }

    /// Whether `src` points into the static image namespace
    ///
    /// Accepts the bare path as well as absolute URLs whose path starts
    /// with the prefix.
    pub fn is_static_path(src: &str) -> bool {
        url_path(src.trim()).starts_with(STATIC_IMAGES_PREFIX)
    }

    /// Map a static path back to the file in this store
    pub fn resolve(&self, src: &str) -> Result<PathBuf, StoreError> {
        let path = url_path(src.trim());
        let name = path
            .strip_prefix(STATIC_IMAGES_PREFIX)
            .ok_or_else(|| StoreError::NotStatic(src.to_string()))?;

        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || name.contains('\0')
        {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Read the bytes of a stored upload
    pub fn read(&self, src: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(src)?;
        Ok(std::fs::read(path)?)
    }
}

/// Path component of a URL or bare path, without query or fragment
fn url_path(src: &str) -> &str {
    let without_scheme = match src.find("://") {
        Some(pos) => {
            let rest = &src[pos + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => src,
    };
    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}

/// Lower-cased alphanumeric extension of a filename
fn extension_of(original_name: &str) -> String {
    let ext: String = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().join("uploads"));

        let path = store.save(b"image-bytes", "Foto.JPG").unwrap();
        assert!(path.starts_with(STATIC_IMAGES_PREFIX));
        assert!(path.ends_with(".jpg"));
        assert_eq!(store.read(&path).unwrap(), b"image-bytes");
    }

    #[test]
    fn test_save_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path());

        let first = store.save(b"a", "same.png").unwrap();
        let second = store.save(b"b", "same.png").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.read(&first).unwrap(), b"a");
        assert_eq!(store.read(&second).unwrap(), b"b");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.PNG"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noext"), "bin");
        assert_eq!(extension_of("weird.p$n%g"), "png");
        assert_eq!(extension_of(""), "bin");
    }

    #[test]
    fn test_is_static_path() {
        assert!(LocalUploadStore::is_static_path("/static/images/a.png"));
        assert!(LocalUploadStore::is_static_path(
            "http://localhost:8000/static/images/a.png?v=2"
        ));
        assert!(!LocalUploadStore::is_static_path("https://example.com/a.png"));
        assert!(!LocalUploadStore::is_static_path("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_resolve_absolute_url() {
        let store = LocalUploadStore::new("/srv/uploads");
        let path = store
            .resolve("https://odt.example.nl/static/images/x.png#frag")
            .unwrap();
        assert_eq!(path, PathBuf::from("/srv/uploads/x.png"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = LocalUploadStore::new("/srv/uploads");
        assert!(matches!(
            store.resolve("/static/images/../secret.txt"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.resolve("/static/images/.."),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.resolve("/static/images/"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.resolve("/other/x.png"),
            Err(StoreError::NotStatic(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path());
        assert!(matches!(
            store.read("/static/images/missing.png"),
            Err(StoreError::Io(_))
        ));
    }
}
