use std::io::{self, Read};

use memchr::memchr2;
use tracing::debug;

use super::encoding::{Detection, Malformed, TextDecoder, TextEncoding, detect_encoding};

/// Bytes pulled from the source per refill.
pub const READ_CHUNK: usize = 4096;

/// Buffered line reader with encoding detection.
///
/// Owns the byte source, one raw chunk buffer and one decode window. Lines
/// end at `\n`, `\r\n` or a bare `\r`, and files may mix all three. Line
/// lengths are counted in bytes of the decoded UTF-8 text.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    chunk: Box<[u8]>,
    window: String,
    pos: usize,
    /// Source offset, relative to `inner`, of the first byte of `window`
    window_start: u64,
    /// Replacement characters in `window` and the source bytes behind them
    malformed: Vec<Malformed>,
    encoding: TextEncoding,
    decoder: TextDecoder,
    detected: bool,
    /// Bytes held back while the byte-order mark is still undecided
    sniff: Vec<u8>,
    base_offset: u64,
    eof: bool,
    lines_read: usize,
}

impl<R: Read> LineReader<R> {
    /// Create a reader that sniffs for a byte-order mark and otherwise
    /// decodes as `fallback`.
    pub fn new(inner: R, fallback: TextEncoding) -> Self {
        Self {
            inner,
            chunk: vec![0u8; READ_CHUNK].into_boxed_slice(),
            window: String::with_capacity(READ_CHUNK),
            pos: 0,
            window_start: 0,
            malformed: Vec::new(),
            encoding: fallback,
            decoder: fallback.new_decoder(),
            detected: false,
            sniff: Vec::new(),
            base_offset: 0,
            eof: false,
            lines_read: 0,
        }
    }

    /// Record that `inner` starts `offset` bytes into the underlying source,
    /// so `position` reports absolute offsets.
    pub fn with_base_offset(mut self, offset: u64) -> Self {
        self.base_offset = offset;
        self
    }

    /// The encoding in effect; final once the first bytes have been read.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether byte-order-mark detection has run.
    pub fn encoding_detected(&self) -> bool {
        self.detected
    }

    /// Number of lines returned so far, including empty ones.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Byte offset in the source just after the last line returned.
    ///
    /// Counted forward from the start of the current window, so bytes still
    /// buffered inside the decoder never shift the result.
    pub fn position(&self) -> u64 {
        self.base_offset + self.window_start + self.source_len(self.pos) as u64
    }

    /// Source bytes behind `window[..end]`.
    ///
    /// Decoded text is re-encoded, except that each U+FFFD standing in for
    /// malformed input counts the bytes it actually replaced.
    fn source_len(&self, end: usize) -> usize {
        let mut len = self.encoding.encoded_len(&self.window[..end]);
        let replacement = self.encoding.encoded_len("\u{FFFD}");
        for m in self.malformed.iter().take_while(|m| m.at < end) {
            len = len.saturating_sub(replacement) + m.len;
        }
        len
    }

    /// Read the next line into `dst`, without its terminator.
    ///
    /// Returns the line's true length, which exceeds `dst.len()` when the line
    /// did not fit; only the first `dst.len()` bytes are written and the rest
    /// of the line is discarded. Returns `None` once the source is exhausted
    /// and no characters were produced.
    pub fn read_line(&mut self, dst: &mut [u8]) -> io::Result<Option<usize>> {
        let mut total = 0usize;
        let mut produced = false;

        loop {
            if self.pos >= self.window.len() && !self.refill()? {
                if produced {
                    self.lines_read += 1;
                    return Ok(Some(total));
                }
                return Ok(None);
            }

            let avail = &self.window.as_bytes()[self.pos..];
            match memchr2(b'\n', b'\r', avail) {
                Some(i) => {
                    copy_bounded(dst, total, &avail[..i]);
                    total += i;

                    let is_cr = avail[i] == b'\r';
                    let at_window_end = i + 1 == avail.len();
                    let crlf = !at_window_end && avail[i + 1] == b'\n';
                    self.pos += i + 1;

                    if is_cr {
                        if crlf {
                            self.pos += 1;
                        } else if at_window_end
                            && self.refill()?
                            && self.window.as_bytes().first() == Some(&b'\n')
                        {
                            // The `\r` was the last character of the old window.
                            self.pos = 1;
                        }
                    }

                    self.lines_read += 1;
                    return Ok(Some(total));
                }
                None => {
                    let n = avail.len();
                    copy_bounded(dst, total, avail);
                    total += n;
                    produced = true;
                    self.pos += n;
                }
            }
        }
    }

    /// Replace the decode window with the next chunk of decoded text.
    ///
    /// Returns `false` only at end of stream with nothing left to decode.
    fn refill(&mut self) -> io::Result<bool> {
        let decoded = self.source_len(self.window.len());
        self.window_start += decoded as u64;
        self.window.clear();
        self.malformed.clear();
        self.pos = 0;

        loop {
            if self.eof {
                return Ok(false);
            }

            let n = read_chunk(&mut self.inner, &mut self.chunk)?;
            if n == 0 {
                self.eof = true;
                let mut tail = std::mem::take(&mut self.sniff);
                if !self.detected {
                    let skip = self.apply_detection(detect_encoding(&tail, true));
                    tail.drain(..skip);
                }
                self.decoder
                    .decode_tracked(&tail, &mut self.window, true, &mut self.malformed);
                return Ok(!self.window.is_empty());
            }

            if self.detected {
                self.decoder.decode_tracked(
                    &self.chunk[..n],
                    &mut self.window,
                    false,
                    &mut self.malformed,
                );
            } else {
                self.sniff.extend_from_slice(&self.chunk[..n]);
                let detection = detect_encoding(&self.sniff, false);
                if detection == Detection::Pending {
                    continue;
                }
                let skip = self.apply_detection(detection);
                let sniffed = std::mem::take(&mut self.sniff);
                self.decoder.decode_tracked(
                    &sniffed[skip..],
                    &mut self.window,
                    false,
                    &mut self.malformed,
                );
            }

            // A chunk ending mid-sequence can decode to nothing yet.
            if !self.window.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Switch encoding if a byte-order mark was found; returns the number of
    /// mark bytes to skip.
    fn apply_detection(&mut self, detection: Detection) -> usize {
        self.detected = true;
        match detection {
            Detection::Bom { encoding, len } => {
                debug!(encoding = encoding.name(), bom_len = len, "byte-order mark detected");
                self.encoding = encoding;
                self.decoder = encoding.new_decoder();
                self.window_start += len as u64;
                len
            }
            Detection::NoBom | Detection::Pending => {
                debug!(encoding = self.encoding.name(), "no byte-order mark, using configured encoding");
                0
            }
        }
    }
}

fn copy_bounded(dst: &mut [u8], at: usize, src: &[u8]) {
    if at < dst.len() {
        let n = src.len().min(dst.len() - at);
        dst[at..at + n].copy_from_slice(&src[..n]);
    }
}

fn read_chunk<R: Read>(inner: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match inner.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
