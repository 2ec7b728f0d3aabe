//! Character encoding detection and decoding for HTML files
//!
//! Files are read as raw bytes. Before tokenizing, the bytes are decoded to
//! UTF-8 text using the charset declared by the document itself:
//!
//! 1. **HTML Meta Tags**: `<meta charset>` or `<meta http-equiv="Content-Type">`
//!    within the first 1024 bytes
//! 2. **Default to UTF-8**: if no declaration is found
//!
//! A byte order mark is not interpreted.
//!
//! # Examples
//!
//! ```rust
//! use html_to_md_converter::charset::{decode_html, detect_charset};
//!
//! let html = b"<html><head><meta charset=\"ISO-8859-1\"></head></html>";
//! assert_eq!(detect_charset(html), "ISO-8859-1");
//!
//! assert_eq!(detect_charset(b"<p>No charset</p>"), "UTF-8");
//!
//! let text = decode_html(b"<p>caf\xC3\xA9</p>").expect("valid UTF-8");
//! assert_eq!(text, "<p>caf\u{e9}</p>");
//! ```

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::ConversionError;

/// Default charset when detection fails
const DEFAULT_CHARSET: &str = "UTF-8";

/// Maximum bytes to scan for meta charset tags (first 1024 bytes)
const META_SCAN_LIMIT: usize = 1024;

/// Detect the character encoding declared by an HTML document
///
/// Returns the declared charset label in uppercase, or `"UTF-8"` when the
/// document declares none.
pub fn detect_charset(html: &[u8]) -> String {
    declared_charset(html)
        .map(|label| label.to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// Charset label from the first `<meta>` declaration in the scanned prefix
///
/// Both `<meta charset="...">` and the `http-equiv="Content-Type"` form, whose
/// `content` attribute carries `charset=...`, match the same pattern.
pub fn declared_charset(html: &[u8]) -> Option<String> {
    static META_CHARSET: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = META_CHARSET
        .get_or_init(|| Regex::new(r#"(?i)<meta\s[^>]*?charset\s*=\s*["']?([^"';>\s]+)"#).ok())
        .as_ref()?;

    let prefix = &html[..html.len().min(META_SCAN_LIMIT)];
    // Lossy conversion is enough to find an ASCII declaration
    let prefix = String::from_utf8_lossy(prefix);

    pattern
        .captures(&prefix)
        .and_then(|caps| caps.get(1))
        .map(|label| label.as_str().to_string())
}

/// Decode HTML bytes to UTF-8 text using the document's declared charset
///
/// Labels resolve as browsers resolve them, so a meta tag claiming UTF-16
/// reads as UTF-8. Valid UTF-8 input is borrowed without copying.
///
/// # Errors
///
/// Returns `ConversionError::EncodingError` when the bytes are invalid for the
/// detected charset or the charset label is unknown.
pub fn decode_html(html: &[u8]) -> Result<Cow<'_, str>, ConversionError> {
    let label = detect_charset(html);
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ConversionError::EncodingError(format!("Unsupported charset '{label}'")))?
        .output_encoding();

    if encoding == UTF_8 {
        return std::str::from_utf8(html).map(Cow::Borrowed).map_err(|e| {
            ConversionError::EncodingError(format!(
                "Invalid UTF-8 at byte position {}: {}",
                e.valid_up_to(),
                e
            ))
        });
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(html)
        .ok_or_else(|| {
            ConversionError::EncodingError(format!(
                "Invalid byte sequence for charset '{}'",
                encoding.name()
            ))
        })
}
