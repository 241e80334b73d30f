//! # csvbind
//!
//! A high-throughput CSV parser that binds rows straight into typed records.
//!
//! ## Overview
//!
//! csvbind provides:
//! - **Typed binding**: Columns map onto struct members through compiled,
//!   per-type parse and format routines built once per parser
//! - **Encoding detection**: UTF-8, UTF-16 and UTF-32 byte-order marks are
//!   sniffed; any WHATWG encoding can be configured as the fallback
//! - **Mixed line endings**: `\n`, `\r\n` and `\r` in the same file
//! - **Quoted fields**: Optional `""` unescaping
//! - **Parallel decoding**: A worker pool fed through a lock-free ring buffer
//!   decodes rows directly into the caller's slice
//!
//! ## Quick Start
//!
//! ```rust
//! use csvbind::{CsvParser, ParserConfig};
//!
//! csvbind::csv_record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Trade {
//!         #[csv(name = "Symbol")]
//!         pub symbol: String,
//!         pub price: f64,
//!         pub size: Option<u32>,
//!     }
//! }
//!
//! fn main() -> Result<(), csvbind::CsvError> {
//!     let data = "Symbol,price,size\nABC,10.5,100\nXYZ,3.25,\n";
//!     let parser = CsvParser::<Trade>::new(ParserConfig::default())?;
//!     let mut session = parser.open(data.as_bytes())?;
//!
//!     let trades: Vec<Trade> = session.records().collect::<Result<_, _>>()?;
//!     assert_eq!(trades.len(), 2);
//!     assert_eq!(trades[1].size, None);
//!     Ok(())
//! }
//! ```
//!
//! ## Batches and threads
//!
//! `Session::fill` decodes into a caller-supplied slice from an offset and
//! reports whether more data may remain. With `multithreaded` set, the
//! calling thread only reads lines; a pool of workers decodes them, each
//! writing to its own slot of the slice. Workers live for the whole session
//! and are joined by `Session::stop` or when the session is dropped.
//!
//! ## Features
//!
//! - `json` - Load `ParserConfig` from JSON
//! - `yaml` - Load `ParserConfig` from YAML
//! - `miette` - Pretty error reporting with miette

pub mod binding;
pub mod config;
pub mod decode;
pub mod error;
pub mod io;
pub mod parser;
pub mod pipeline;
pub mod queue;
pub mod reader;

pub use binding::{
    BindingTable, CsvField, CsvRecord, CustomSerializer, DisplayFormatted, FieldBinding, FieldSet,
    ReusableField, ValueKind,
};
pub use config::{HeaderMode, ParserConfig};
pub use error::{ConversionError, CsvError, ErrorKind, Result};
pub use io::{ByteSource, FileSource, MemorySource};
pub use parser::{CsvParser, Records, Session, SessionState};
pub use pipeline::Filled;
pub use queue::CircularBuffer;
pub use reader::{LineReader, TextEncoding};

#[cfg(feature = "miette")]
pub use error::CsvDiagnostic;
