//! Text encodings, byte-order-mark detection and chunked decoding.
//!
//! Decoding goes through `encoding_rs` for every WHATWG encoding. UTF-32 is
//! not a WHATWG encoding, so its two byte orders are decoded here.

use std::fmt;

use encoding_rs::{Decoder, DecoderResult, Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// An encoding the line reader can decode.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Standard(&'static Encoding),
    Utf32Le,
    Utf32Be,
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextEncoding({})", self.name())
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::utf8()
    }
}

impl TextEncoding {
    pub fn utf8() -> Self {
        TextEncoding::Standard(UTF_8)
    }

    pub fn utf16le() -> Self {
        TextEncoding::Standard(UTF_16LE)
    }

    pub fn utf16be() -> Self {
        TextEncoding::Standard(UTF_16BE)
    }

    /// Look up an encoding by label, e.g. `"utf-8"`, `"latin1"`, `"utf-32be"`.
    pub fn for_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-32" | "utf-32le" | "utf32" | "utf32le" => Some(TextEncoding::Utf32Le),
            "utf-32be" | "utf32be" => Some(TextEncoding::Utf32Be),
            other => Encoding::for_label(other.as_bytes()).map(TextEncoding::Standard),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Standard(enc) => enc.name(),
            TextEncoding::Utf32Le => "UTF-32LE",
            TextEncoding::Utf32Be => "UTF-32BE",
        }
    }

    /// A fresh decoder; byte-order marks are handled by `detect_encoding`,
    /// never by the decoder itself.
    pub fn new_decoder(&self) -> TextDecoder {
        match self {
            TextEncoding::Standard(enc) => {
                TextDecoder::Standard(enc.new_decoder_without_bom_handling())
            }
            TextEncoding::Utf32Le => TextDecoder::utf32(false),
            TextEncoding::Utf32Be => TextDecoder::utf32(true),
        }
    }

    /// Number of source bytes `text` occupied before decoding.
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            TextEncoding::Standard(enc) if *enc == UTF_8 => text.len(),
            TextEncoding::Standard(enc) if *enc == UTF_16LE || *enc == UTF_16BE => {
                text.encode_utf16().count() * 2
            }
            TextEncoding::Standard(enc) => enc.encode(text).0.len(),
            TextEncoding::Utf32Le | TextEncoding::Utf32Be => text.chars().count() * 4,
        }
    }
}

/// Outcome of inspecting the first bytes of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Not enough bytes yet to decide
    Pending,
    /// A byte-order mark of `len` bytes selects `encoding`
    Bom { encoding: TextEncoding, len: usize },
    /// No byte-order mark; keep the configured encoding
    NoBom,
}

/// Inspect the first bytes of a source for a byte-order mark.
///
/// `eof` tells whether `bytes` is everything the source will ever produce;
/// otherwise a prefix that could still grow into a longer mark is reported
/// as `Pending` (fewer than two bytes, or `FF FE` that might be UTF-32LE).
pub fn detect_encoding(bytes: &[u8], eof: bool) -> Detection {
    let need_more = |n: usize| !eof && bytes.len() < n;

    if bytes.len() < 2 {
        return if eof { Detection::NoBom } else { Detection::Pending };
    }

    match (bytes[0], bytes[1]) {
        (0xFE, 0xFF) => Detection::Bom {
            encoding: TextEncoding::utf16be(),
            len: 2,
        },
        (0xFF, 0xFE) => {
            if need_more(4) {
                Detection::Pending
            } else if bytes.len() >= 4 && bytes[2] == 0 && bytes[3] == 0 {
                Detection::Bom {
                    encoding: TextEncoding::Utf32Le,
                    len: 4,
                }
            } else {
                Detection::Bom {
                    encoding: TextEncoding::utf16le(),
                    len: 2,
                }
            }
        }
        (0x00, 0x00) => {
            if need_more(4) {
                Detection::Pending
            } else if bytes.len() >= 4 && bytes[2] == 0xFE && bytes[3] == 0xFF {
                Detection::Bom {
                    encoding: TextEncoding::Utf32Be,
                    len: 4,
                }
            } else {
                Detection::NoBom
            }
        }
        (0xEF, 0xBB) => {
            if need_more(3) {
                Detection::Pending
            } else if bytes.len() >= 3 && bytes[2] == 0xBF {
                Detection::Bom {
                    encoding: TextEncoding::utf8(),
                    len: 3,
                }
            } else {
                Detection::NoBom
            }
        }
        _ => Detection::NoBom,
    }
}

/// Streaming decoder that appends decoded text to a `String`.
pub enum TextDecoder {
    Standard(Decoder),
    Utf32 {
        big_endian: bool,
        pending: [u8; 4],
        pending_len: usize,
    },
}

impl fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextDecoder::Standard(d) => write!(f, "TextDecoder({})", d.encoding().name()),
            TextDecoder::Utf32 { big_endian, .. } => {
                write!(f, "TextDecoder(UTF-32{})", if *big_endian { "BE" } else { "LE" })
            }
        }
    }
}

impl TextDecoder {
    fn utf32(big_endian: bool) -> Self {
        TextDecoder::Utf32 {
            big_endian,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    /// Decode `bytes` and append the text to `out`.
    ///
    /// Incomplete trailing sequences are kept for the next call unless
    /// `last` is set, in which case they decode to U+FFFD.
    pub fn decode(&mut self, bytes: &[u8], out: &mut String, last: bool) {
        let mut malformed = Vec::new();
        self.decode_tracked(bytes, out, last, &mut malformed);
    }

    /// Like [`decode`](Self::decode), and also records every U+FFFD that
    /// stands in for malformed input, with the number of source bytes it
    /// replaced.
    pub fn decode_tracked(
        &mut self,
        bytes: &[u8],
        out: &mut String,
        last: bool,
        malformed: &mut Vec<Malformed>,
    ) {
        match self {
            TextDecoder::Standard(decoder) => {
                let mut src = bytes;
                loop {
                    let needed = decoder
                        .max_utf8_buffer_length_without_replacement(src.len())
                        .unwrap_or(src.len() * 3 + 16);
                    out.reserve(needed);
                    let (result, read) =
                        decoder.decode_to_string_without_replacement(src, out, last);
                    src = &src[read..];
                    match result {
                        DecoderResult::InputEmpty => break,
                        DecoderResult::OutputFull => {}
                        DecoderResult::Malformed(len, _) => {
                            malformed.push(Malformed {
                                at: out.len(),
                                len: len as usize,
                            });
                            out.push(char::REPLACEMENT_CHARACTER);
                        }
                    }
                }
            }
            TextDecoder::Utf32 {
                big_endian,
                pending,
                pending_len,
            } => {
                out.reserve(bytes.len() / 4 + 1);
                let mut src = bytes;

                if *pending_len > 0 {
                    let take = (4 - *pending_len).min(src.len());
                    pending[*pending_len..*pending_len + take].copy_from_slice(&src[..take]);
                    *pending_len += take;
                    src = &src[take..];
                    if *pending_len == 4 {
                        push_utf32(*pending, *big_endian, out, malformed);
                        *pending_len = 0;
                    }
                }

                let mut units = src.chunks_exact(4);
                for unit in &mut units {
                    let quad = [unit[0], unit[1], unit[2], unit[3]];
                    push_utf32(quad, *big_endian, out, malformed);
                }
                let rest = units.remainder();
                pending[*pending_len..*pending_len + rest.len()].copy_from_slice(rest);
                *pending_len += rest.len();

                if last && *pending_len > 0 {
                    malformed.push(Malformed {
                        at: out.len(),
                        len: *pending_len,
                    });
                    out.push(char::REPLACEMENT_CHARACTER);
                    *pending_len = 0;
                }
            }
        }
    }
}

/// A U+FFFD in decoded text that replaced `len` malformed source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Malformed {
    /// Byte index of the replacement character in the decoded text
    pub at: usize,
    pub len: usize,
}

fn push_utf32(quad: [u8; 4], big_endian: bool, out: &mut String, malformed: &mut Vec<Malformed>) {
    match utf32_char(quad, big_endian) {
        Some(c) => out.push(c),
        None => {
            malformed.push(Malformed { at: out.len(), len: 4 });
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}

fn utf32_char(quad: [u8; 4], big_endian: bool) -> Option<char> {
    let code = if big_endian {
        u32::from_be_bytes(quad)
    } else {
        u32::from_le_bytes(quad)
    };
    char::from_u32(code)
}
