//! Parser and parsing sessions.
//!
//! A [`CsvParser`] compiles the binding table for a record type once, from a
//! [`ParserConfig`]. Each call to [`CsvParser::open`] starts a [`Session`]
//! over one byte source: the session detects the encoding, handles the
//! header row, and then produces records either one at a time on the calling
//! thread or in batches through the worker pool.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binding::{BindingTable, CsvRecord, ParseOptions};
use crate::config::{HeaderMode, ParserConfig};
use crate::decode::RowDecoder;
use crate::error::{CsvError, Result};
use crate::io::{ByteSource, FileSource};
use crate::pipeline::{Filled, WorkerPool};
use crate::reader::{LineReader, TextEncoding, line_text};

/// Compiled bindings plus options for one record type.
///
/// Cheap to share: sessions hold the binding table through an `Arc`.
pub struct CsvParser<T: CsvRecord> {
    config: ParserConfig,
    table: Arc<BindingTable<T>>,
    fallback: TextEncoding,
}

impl<T: CsvRecord> CsvParser<T> {
    /// Validate `config` and build the binding table for `T`.
    ///
    /// All configuration errors surface here, before any row is read.
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let fallback = config.resolve_encoding()?.unwrap_or_default();
        let table = BindingTable::<T>::build(&config)?;
        debug!(
            columns = table.len(),
            bound = table.bound_count(),
            "built binding table"
        );
        Ok(Self {
            config,
            table: Arc::new(table),
            fallback,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The declared binding table, before any header is applied.
    pub fn bindings(&self) -> &BindingTable<T> {
        &self.table
    }

    /// Column names of the declared table.
    pub fn column_names(&self) -> Vec<String> {
        self.table.column_names()
    }

    /// Start a session over `reader`, consuming the header row if the
    /// header mode asks for one.
    pub fn open<R: Read>(&self, reader: R) -> Result<Session<T, R>> {
        Session::start(self, reader)
    }

    /// Start a session over a [`ByteSource`].
    pub fn open_source(&self, source: &dyn ByteSource) -> Result<Session<T, Box<dyn Read + Send>>> {
        let reader = source.open().map_err(|e| CsvError {
            message: format!("failed to open input '{}': {e}", source.id()),
            ..CsvError::io(None, e)
        })?;
        self.open(reader)
    }

    /// Start a session over a file.
    pub fn open_path(&self, path: impl AsRef<Path>) -> Result<Session<T, Box<dyn Read + Send>>> {
        self.open_source(&FileSource::new(path.as_ref()))
    }
}

impl<T: CsvRecord> std::fmt::Debug for CsvParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvParser")
            .field("config", &self.config)
            .field("table", &self.table)
            .finish()
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Finished or stopped; no workers are running
    Idle,
    /// Opened and the header handled; no rows read yet
    HeaderBound,
    /// Rows are being produced
    Streaming,
    /// A threaded batch filled its destination; workers wait for the next one
    Draining,
}

/// One pass over one byte source.
pub struct Session<T: CsvRecord, R> {
    reader: LineReader<R>,
    table: Arc<BindingTable<T>>,
    decoder: RowDecoder,
    line_buf: Box<[u8]>,
    config: ParserConfig,
    pool: Option<WorkerPool<T>>,
    state: SessionState,
    exhausted: bool,
}

impl<T: CsvRecord, R: Read> Session<T, R> {
    fn start(parser: &CsvParser<T>, reader: R) -> Result<Self> {
        let config = parser.config.clone();
        let opts = ParseOptions {
            fast_numeric: config.fast_numeric_parsing,
        };
        let mut session = Self {
            reader: LineReader::new(reader, parser.fallback),
            table: Arc::clone(&parser.table),
            decoder: RowDecoder::new(opts),
            line_buf: vec![0u8; config.max_line_length].into_boxed_slice(),
            config,
            pool: None,
            state: SessionState::HeaderBound,
            exhausted: false,
        };

        let header_mode = session.config.header_mode;
        match header_mode {
            HeaderMode::None => {}
            HeaderMode::ParseAndBind => match session.read_header()? {
                Some(header) if header.trim_start_matches('\u{FEFF}').is_empty() => {
                    debug!("empty header row, keeping declared column layout");
                }
                Some(header) => session.table = Arc::new(session.table.bind_header(&header)),
                None => session.finish(),
            },
            HeaderMode::SkipUnbound => {
                if session.read_header()?.is_none() {
                    session.finish();
                }
            }
        }

        Ok(session)
    }

    fn read_header(&mut self) -> Result<Option<String>> {
        let Some(len) = self.reader.read_line(&mut self.line_buf)? else {
            return Ok(None);
        };
        if len > self.line_buf.len() {
            warn!(
                line = 1,
                length = len,
                limit = self.line_buf.len(),
                "header row exceeds max_line_length and was truncated"
            );
        }
        Ok(Some(line_text(&self.line_buf, len).to_string()))
    }

    /// Read the next non-empty line into `buf`; returns its true length and
    /// 1-based line number.
    fn next_line(
        reader: &mut LineReader<R>,
        buf: &mut [u8],
    ) -> Result<Option<(usize, usize)>> {
        loop {
            let len = match reader.read_line(buf) {
                Ok(Some(len)) => len,
                Ok(None) => return Ok(None),
                Err(e) => return Err(CsvError::io(Some(reader.lines_read() + 1), e)),
            };
            let line_no = reader.lines_read();
            if len == 0 {
                continue;
            }
            if len > buf.len() {
                warn!(
                    line = line_no,
                    length = len,
                    limit = buf.len(),
                    "line exceeds max_line_length and was truncated"
                );
            }
            return Ok(Some((len, line_no)));
        }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        if let Some(mut pool) = self.pool.take() {
            pool.stop();
        }
        self.state = SessionState::Idle;
    }

    /// Read and decode the next row into `record`, on the calling thread.
    ///
    /// Returns `false` once the source is exhausted. Empty lines are skipped.
    pub fn parse_row(&mut self, record: &mut T) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.state = SessionState::Streaming;
        match Self::next_line(&mut self.reader, &mut self.line_buf)? {
            Some((len, line_no)) => {
                let text = line_text(&self.line_buf, len);
                self.decoder.decode(record, text, line_no, &self.table)?;
                Ok(true)
            }
            None => {
                self.finish();
                Ok(false)
            }
        }
    }

    /// Decode rows into `dest[offset..]` until it is full or the source ends.
    ///
    /// Records are decoded in place over the slice's current contents. With
    /// `multithreaded` set the rows are decoded by the worker pool, started on
    /// first use and kept for later batches.
    pub fn fill(&mut self, dest: &mut [T], offset: usize) -> Result<Filled> {
        if offset > dest.len() {
            return Err(CsvError::configuration(format!(
                "offset {offset} is past the end of a destination of length {}",
                dest.len()
            )));
        }
        if self.exhausted {
            return Ok(Filled {
                rows: 0,
                more_data: false,
            });
        }

        self.state = SessionState::Streaming;
        let filled = if self.config.multithreaded {
            self.fill_threaded(dest, offset)?
        } else {
            self.fill_inline(dest, offset)?
        };

        if filled.more_data {
            if self.pool.is_some() {
                self.state = SessionState::Draining;
            }
        } else {
            self.finish();
        }
        Ok(filled)
    }

    fn fill_inline(&mut self, dest: &mut [T], offset: usize) -> Result<Filled> {
        let mut rows = 0;
        for record in &mut dest[offset..] {
            if !self.parse_row(record)? {
                return Ok(Filled {
                    rows,
                    more_data: false,
                });
            }
            rows += 1;
        }
        Ok(Filled {
            rows,
            more_data: true,
        })
    }

    fn fill_threaded(&mut self, dest: &mut [T], offset: usize) -> Result<Filled> {
        if self.pool.is_none() {
            let opts = *self.decoder.options();
            self.pool = Some(WorkerPool::start(
                Arc::clone(&self.table),
                self.config.effective_worker_threads(),
                self.config.queue_capacity,
                self.config.max_line_length,
                opts,
            )?);
        }
        let reader = &mut self.reader;
        match self.pool.as_mut() {
            Some(pool) => pool.fill(dest, offset, |buf| Self::next_line(reader, buf)),
            None => Ok(Filled {
                rows: 0,
                more_data: false,
            }),
        }
    }

    /// Lazily decode the remaining rows.
    ///
    /// Single-threaded sessions decode one row per call to `next`; threaded
    /// sessions decode `threaded_batch_size` rows at a time and yield them in
    /// order.
    pub fn records(&mut self) -> Records<'_, T, R> {
        Records {
            session: self,
            batch: Vec::new(),
            pos: 0,
            filled: 0,
            more_data: true,
            done: false,
        }
    }

    /// Names of the columns bound for this session, in column order.
    pub fn column_names(&self) -> Vec<String> {
        self.table.column_names()
    }

    /// The binding table rows are decoded against.
    pub fn bindings(&self) -> &BindingTable<T> {
        &self.table
    }

    /// Byte offset in the source just after the last line read.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// 1-based number of the last physical line read.
    pub fn line_number(&self) -> usize {
        self.reader.lines_read()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.reader.encoding()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stop and join the workers. The session reads no further rows.
    pub fn stop(&mut self) {
        self.finish();
    }
}

impl<T: CsvRecord, R> std::fmt::Debug for Session<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("exhausted", &self.exhausted)
            .field("table", &self.table)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Iterator over the remaining records of a session.
pub struct Records<'s, T: CsvRecord, R> {
    session: &'s mut Session<T, R>,
    batch: Vec<T>,
    pos: usize,
    filled: usize,
    more_data: bool,
    done: bool,
}

impl<T: CsvRecord, R: Read> Records<'_, T, R> {
    fn next_threaded(&mut self) -> Option<Result<T>> {
        if self.pos == self.filled {
            if !self.more_data {
                self.done = true;
                return None;
            }
            if self.batch.is_empty() {
                let size = self.session.config.threaded_batch_size;
                self.batch.resize_with(size, T::default);
            }
            match self.session.fill(&mut self.batch, 0) {
                Ok(filled) => {
                    self.pos = 0;
                    self.filled = filled.rows;
                    self.more_data = filled.more_data;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            if self.filled == 0 {
                self.done = true;
                return None;
            }
        }
        // Taking leaves a default record behind for the next batch.
        let record = std::mem::take(&mut self.batch[self.pos]);
        self.pos += 1;
        Some(Ok(record))
    }
}

impl<T: CsvRecord, R: Read> Iterator for Records<'_, T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        if self.session.config.multithreaded {
            return self.next_threaded();
        }

        let mut record = T::default();
        match self.session.parse_row(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
