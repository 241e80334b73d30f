//! Buffered line reading over arbitrary byte sources.
//!
//! This module provides:
//! - `TextEncoding` / `TextDecoder`: What the bytes are and how to decode them
//! - `detect_encoding`: Byte-order-mark sniffing
//! - `LineReader`: Splits decoded text into lines across `\n`, `\r\n` and `\r`

mod encoding;
mod line_reader;

pub use encoding::{Detection, Malformed, TextDecoder, TextEncoding, detect_encoding};
pub use line_reader::{LineReader, READ_CHUNK};

/// View the first `len` bytes of a line buffer as text.
///
/// `len` may be the true length of a truncated line, so it is clamped to the
/// buffer; a multi-byte character cut by truncation is dropped.
pub fn line_text(buf: &[u8], len: usize) -> &str {
    let bytes = &buf[..len.min(buf.len())];
    match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            // Only the cut at the very end can be invalid; the rest came
            // from a decoded `String`.
            let valid = &bytes[..e.valid_up_to()];
            std::str::from_utf8(valid).unwrap_or_default()
        }
    }
}
