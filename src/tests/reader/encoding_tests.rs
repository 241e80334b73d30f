//! Tests for byte-order-mark detection and decoding.

use crate::reader::{Detection, Malformed, TextEncoding, detect_encoding};

#[test]
fn detects_utf16_marks() {
    assert_eq!(
        detect_encoding(&[0xFE, 0xFF, 0x00, 0x41], false),
        Detection::Bom {
            encoding: TextEncoding::utf16be(),
            len: 2
        }
    );
    assert_eq!(
        detect_encoding(&[0xFF, 0xFE, 0x41, 0x00], false),
        Detection::Bom {
            encoding: TextEncoding::utf16le(),
            len: 2
        }
    );
}

#[test]
fn detects_utf32_marks() {
    assert_eq!(
        detect_encoding(&[0xFF, 0xFE, 0x00, 0x00, 0x41], false),
        Detection::Bom {
            encoding: TextEncoding::Utf32Le,
            len: 4
        }
    );
    assert_eq!(
        detect_encoding(&[0x00, 0x00, 0xFE, 0xFF], false),
        Detection::Bom {
            encoding: TextEncoding::Utf32Be,
            len: 4
        }
    );
}

#[test]
fn detects_utf8_mark() {
    assert_eq!(
        detect_encoding(&[0xEF, 0xBB, 0xBF, b'a'], false),
        Detection::Bom {
            encoding: TextEncoding::utf8(),
            len: 3
        }
    );
}

#[test]
fn short_prefixes_are_pending_until_eof() {
    assert_eq!(detect_encoding(&[], false), Detection::Pending);
    assert_eq!(detect_encoding(&[0xFF], false), Detection::Pending);
    assert_eq!(detect_encoding(&[0xFF, 0xFE], false), Detection::Pending);
    assert_eq!(detect_encoding(&[0xEF, 0xBB], false), Detection::Pending);

    assert_eq!(detect_encoding(&[0xFF], true), Detection::NoBom);
    assert_eq!(
        detect_encoding(&[0xFF, 0xFE], true),
        Detection::Bom {
            encoding: TextEncoding::utf16le(),
            len: 2
        }
    );
}

#[test]
fn plain_text_has_no_mark() {
    assert_eq!(detect_encoding(b"id,name", false), Detection::NoBom);
    assert_eq!(detect_encoding(&[0x00, 0x00, 0x00, 0x41], false), Detection::NoBom);
}

#[test]
fn labels_resolve_to_encodings() {
    assert_eq!(TextEncoding::for_label("utf-8"), Some(TextEncoding::utf8()));
    assert_eq!(TextEncoding::for_label(" UTF-16LE "), Some(TextEncoding::utf16le()));
    assert_eq!(TextEncoding::for_label("utf-32be"), Some(TextEncoding::Utf32Be));
    assert_eq!(
        TextEncoding::for_label("latin1").map(|e| e.name()),
        Some("windows-1252")
    );
    assert_eq!(TextEncoding::for_label("no-such-encoding"), None);
}

#[test]
fn utf32_decoder_handles_split_code_units() {
    let text = "héllo, 世界";
    let bytes: Vec<u8> = text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect();

    let mut decoder = TextEncoding::Utf32Le.new_decoder();
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        decoder.decode(chunk, &mut out, false);
    }
    decoder.decode(&[], &mut out, true);

    assert_eq!(out, text);
}

#[test]
fn utf32_decoder_replaces_incomplete_tail() {
    let mut decoder = TextEncoding::Utf32Be.new_decoder();
    let mut out = String::new();
    decoder.decode(&[0x00, 0x00, 0x00, 0x41, 0x00, 0x00], &mut out, true);
    assert_eq!(out, "A\u{FFFD}");
}

#[test]
fn tracked_decoding_records_replaced_bytes() {
    let mut decoder = TextEncoding::utf8().new_decoder();
    let mut out = String::new();
    let mut malformed = Vec::new();
    decoder.decode_tracked(b"a\xFFb\xE2\x82", &mut out, false, &mut malformed);
    decoder.decode_tracked(b"c", &mut out, true, &mut malformed);

    assert_eq!(out, "a\u{FFFD}b\u{FFFD}c");
    assert_eq!(
        malformed,
        vec![Malformed { at: 1, len: 1 }, Malformed { at: 5, len: 2 }]
    );
}

#[test]
fn encoded_len_counts_source_bytes() {
    assert_eq!(TextEncoding::utf8().encoded_len("a€"), 4);
    assert_eq!(TextEncoding::utf16le().encoded_len("a€"), 4);
    assert_eq!(TextEncoding::Utf32Be.encoded_len("a€"), 8);
    let latin = TextEncoding::for_label("windows-1252").unwrap();
    assert_eq!(latin.encoded_len("café"), 4);
}
