//! In-memory byte source.

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use super::ByteSource;

/// Shared in-memory CSV bytes; cloning the source does not copy the data.
#[derive(Debug, Clone)]
pub struct MemorySource {
    id: String,
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(id: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }

    /// Create a source holding the UTF-8 bytes of a string.
    pub fn from_string(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text.into().into_bytes())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reader over a shared byte slice.
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ByteSource for MemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(SharedBytes(self.data.clone()))))
    }
}
