use std::fmt;
use std::ops::Deref;

use super::value::{CsvField, ParseOptions, ValueKind};
use crate::error::ConversionError;

/// Capacity given to a `ReusableField` created without an explicit one.
pub const DEFAULT_REUSABLE_CAPACITY: usize = 64;

/// A string with fixed backing storage, allocated once.
///
/// `update` overwrites the content in place, so a record decoded row after
/// row into the same value never allocates for this member. Text longer than
/// the capacity is cut at the last character boundary that fits.
#[derive(Clone)]
pub struct ReusableField {
    storage: Box<[u8]>,
    len: usize,
}

impl ReusableField {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Replace the content with `source`, truncated to the capacity.
    ///
    /// Returns the number of bytes stored.
    pub fn update(&mut self, source: &str) -> usize {
        let mut n = source.len().min(self.storage.len());
        while !source.is_char_boundary(n) {
            n -= 1;
        }
        self.storage[..n].copy_from_slice(&source.as_bytes()[..n]);
        self.len = n;
        n
    }

    pub fn as_str(&self) -> &str {
        // Content is only ever copied from a `&str` at a char boundary.
        std::str::from_utf8(&self.storage[..self.len]).unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for ReusableField {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REUSABLE_CAPACITY)
    }
}

impl Deref for ReusableField {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for ReusableField {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ReusableField {}

impl PartialEq<str> for ReusableField {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ReusableField {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl std::hash::Hash for ReusableField {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for ReusableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReusableField")
            .field("value", &self.as_str())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl fmt::Display for ReusableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CsvField for ReusableField {
    const KIND: ValueKind = ValueKind::Reusable;

    fn parse(text: &str, _opts: &ParseOptions) -> Result<Self, ConversionError> {
        let mut field = Self::with_capacity(text.len().max(DEFAULT_REUSABLE_CAPACITY));
        field.update(text);
        Ok(field)
    }

    fn parse_into(&mut self, text: &str, _opts: &ParseOptions) -> Result<(), ConversionError> {
        self.update(text);
        Ok(())
    }

    fn format(&self, out: &mut String) {
        out.push_str(self.as_str());
    }
}
