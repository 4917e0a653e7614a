//! Response metadata for HTTP front ends
//!
//! The HTTP layer itself lives outside this crate; these are the values it
//! needs to deliver a rendered document.

use crate::config::DEFAULT_FILENAME;

/// Content type of the rendered document
pub const ODT_CONTENT_TYPE: &str = odtbuilder_odf::ODT_MIMETYPE;

/// Header carrying the attachment filename
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Response headers cross-origin callers must be allowed to read
pub const EXPOSED_HEADERS: &[&str] = &[CONTENT_DISPOSITION];

/// `Content-Disposition` value for an attachment
///
/// The filename is reduced to its last path component; quotes and control
/// characters are dropped.
///
/// ```
/// use odtbuilder_core::transport::content_disposition;
///
/// assert_eq!(content_disposition("brief.odt"), "attachment; filename=\"brief.odt\"");
/// ```
pub fn content_disposition(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect::<String>();
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_FILENAME } else { name };
    format!("attachment; filename=\"{}\"", name)
}

/// A rendered document ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdtExport {
    /// Attachment filename
    pub filename: String,
    /// Package bytes
    pub bytes: Vec<u8>,
}

impl OdtExport {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn content_type(&self) -> &'static str {
        ODT_CONTENT_TYPE
    }

    /// Response headers for this export
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", ODT_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&self.filename)),
            ("Access-Control-Expose-Headers", EXPOSED_HEADERS.join(", ")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_sanitizes() {
        assert_eq!(
            content_disposition("../../etc/x\".odt"),
            "attachment; filename=\"x.odt\""
        );
        assert_eq!(
            content_disposition(""),
            "attachment; filename=\"document.odt\""
        );
    }

    #[test]
    fn test_export_headers() {
        let export = OdtExport::new("document.odt", vec![1, 2, 3]);
        let headers = export.headers();
        assert_eq!(
            headers[0],
            (
                "Content-Type",
                "application/vnd.oasis.opendocument.text".to_string()
            )
        );
        assert_eq!(headers[2].1, "Content-Disposition");
    }
}
