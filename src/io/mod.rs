//! Byte sources a parser session can be opened on.
//!
//! The engine only ever needs sequential reads, so any `std::io::Read`
//! works directly. `ByteSource` names reusable sources that can be opened
//! more than once (files, shared in-memory buffers) and carry an identifier
//! for log output.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use std::fmt::Debug;
use std::io::Read;

/// A reopenable source of CSV bytes.
pub trait ByteSource: Send + Sync + Debug {
    /// Returns an identifier for this source, used in log output.
    ///
    /// Convention: file path for files, a caller-chosen name otherwise.
    fn id(&self) -> &str;

    /// Open and return a new readable stream positioned at the beginning.
    fn open(&self) -> std::io::Result<Box<dyn Read + Send>>;
}
