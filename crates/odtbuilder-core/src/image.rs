//! Image resolution with fallback chain
//!
//! An image `src` from the editor can point at an upload, carry the image
//! inline as a data URI, or reference a remote URL. The resolver tries its
//! sources in priority order; the first one that yields bytes wins.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ImageResolver                 │
//! ├──────────────────────────────────────────────┤
//! │  1. UploadStoreSource   /static/images/...   │
//! │  2. DataUriSource       data:...;base64,...  │
//! │  3. HttpSource          http(s)://...        │
//! └──────────────────────────────────────────────┘
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::ImageSettings;
use crate::error::ResolveError;
use crate::store::LocalUploadStore;

/// A place images can be loaded from
pub trait ImageSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Whether this source understands `src`
    fn accepts(&self, src: &str) -> bool;

    /// Load the image bytes
    fn fetch(&self, src: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Reads uploads from the local store
pub struct UploadStoreSource {
    store: LocalUploadStore,
}

impl UploadStoreSource {
    pub fn new(store: LocalUploadStore) -> Self {
        Self { store }
    }
}

impl ImageSource for UploadStoreSource {
    fn name(&self) -> &'static str {
        "upload-store"
    }

    fn accepts(&self, src: &str) -> bool {
        LocalUploadStore::is_static_path(src)
    }

    fn fetch(&self, src: &str) -> Result<Vec<u8>, ResolveError> {
        Ok(self.store.read(src)?)
    }
}

/// Decodes base64 `data:` URIs
#[derive(Debug, Default)]
pub struct DataUriSource;

impl ImageSource for DataUriSource {
    fn name(&self) -> &'static str {
        "data-uri"
    }

    fn accepts(&self, src: &str) -> bool {
        src.trim_start()
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    }

    fn fetch(&self, src: &str) -> Result<Vec<u8>, ResolveError> {
        let src = src.trim();
        let (header, payload) = src
            .split_once(',')
            .ok_or_else(|| ResolveError::InvalidDataUri("missing ','".to_string()))?;

        if !header.to_ascii_lowercase().ends_with(";base64") {
            return Err(ResolveError::InvalidDataUri(
                "only base64 payloads are supported".to_string(),
            ));
        }

        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(STANDARD.decode(payload)?)
    }
}

/// Fetches http(s) URLs
///
/// Bodies are read up to `max_bytes`; a larger body is rejected without
/// being buffered.
#[cfg(feature = "remote")]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    max_bytes: usize,
}

#[cfg(feature = "remote")]
impl HttpSource {
    /// Create a source with the given request timeout and body limit
    pub fn new(timeout: std::time::Duration, max_bytes: usize) -> Result<Self, ResolveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("odtbuilder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, max_bytes })
    }
}

#[cfg(feature = "remote")]
impl ImageSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn accepts(&self, src: &str) -> bool {
        let src = src.trim_start().to_ascii_lowercase();
        src.starts_with("http://") || src.starts_with("https://")
    }

    fn fetch(&self, src: &str) -> Result<Vec<u8>, ResolveError> {
        let response = self.client.get(src.trim()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }
        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(ResolveError::TooLarge {
                    size: usize::try_from(length).unwrap_or(usize::MAX),
                    max: self.max_bytes,
                });
            }
        }
        read_limited(response, self.max_bytes)
    }
}

/// Read at most `max_bytes` from `reader`
///
/// Fails with [`ResolveError::TooLarge`] once more than `max_bytes` have
/// been read.
#[cfg(any(feature = "remote", test))]
fn read_limited<R: std::io::Read>(reader: R, max_bytes: usize) -> Result<Vec<u8>, ResolveError> {
    use std::io::Read;

    let limit = (max_bytes as u64).saturating_add(1);
    let mut data = Vec::new();
    reader.take(limit).read_to_end(&mut data)?;
    if data.len() > max_bytes {
        return Err(ResolveError::TooLarge {
            size: data.len(),
            max: max_bytes,
        });
    }
    Ok(data)
}

/// Resolves image references through a chain of sources
pub struct ImageResolver {
    /// Registered sources in priority order
    sources: Vec<Box<dyn ImageSource>>,
    /// Largest accepted image
    max_bytes: usize,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::empty()
    }
}

impl ImageResolver {
    /// Create the default chain for a configuration
    ///
    /// - upload store rooted at `store`
    /// - data URIs
    /// - http(s), when `settings.remote` is set and the `remote` feature is on
    pub fn new(store: LocalUploadStore, settings: &ImageSettings) -> Self {
        let mut resolver = Self::empty().with_max_bytes(settings.max_bytes);
        resolver.add_source(Box::new(UploadStoreSource::new(store)));
        resolver.add_source(Box::new(DataUriSource));

        #[cfg(feature = "remote")]
        {
            if settings.remote {
                let timeout = std::time::Duration::from_secs(settings.timeout_secs);
                match HttpSource::new(timeout, settings.max_bytes) {
                    Ok(http) => resolver.add_source(Box::new(http)),
                    Err(e) => log::warn!("Failed to initialize HTTP image source: {}", e),
                }
            }
        }

        resolver
    }

    /// Create a resolver with no sources (for testing)
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            max_bytes: usize::MAX,
        }
    }

    /// Set the size limit
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Add a source at the lowest priority
    pub fn add_source(&mut self, source: Box<dyn ImageSource>) {
        log::debug!("Added image source: {}", source.name());
        self.sources.push(source);
    }

    /// Resolve `src` to image bytes
    ///
    /// Tries every source that accepts `src`; a failing source falls
    /// through to the next. Empty or oversized results count as failures.
    pub fn resolve(&self, src: &str) -> Result<Vec<u8>, ResolveError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ResolveError::NoSource);
        }

        let mut last_error = None;
        for source in self.sources.iter().filter(|s| s.accepts(src)) {
            log::debug!("Trying image source {} for {}", source.name(), abbreviate(src));
            match source.fetch(src) {
                Ok(bytes) if bytes.is_empty() => {
                    log::warn!("Image source {} returned no data", source.name());
                    last_error = Some(ResolveError::Empty);
                }
                Ok(bytes) if bytes.len() > self.max_bytes => {
                    log::warn!(
                        "Image from {} is too large ({} bytes)",
                        source.name(),
                        bytes.len()
                    );
                    last_error = Some(ResolveError::TooLarge {
                        size: bytes.len(),
                        max: self.max_bytes,
                    });
                }
                Ok(bytes) => {
                    log::debug!("Resolved {} bytes via {}", bytes.len(), source.name());
                    return Ok(bytes);
                }
                Err(e) => {
                    log::warn!("Image source {} failed: {}", source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ResolveError::Unsupported(abbreviate(src))))
    }
}

/// Shorten data URIs and long URLs for log output
fn abbreviate(src: &str) -> String {
    const MAX: usize = 80;
    match src.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &src[..cut]),
        None => src.to_string(),
    }
}
