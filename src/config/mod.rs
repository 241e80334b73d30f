//! Parser configuration.
//!
//! This module provides:
//! - `ParserConfig`: Immutable options shared by a parser and its sessions
//! - `HeaderMode`: How the first row of a file is treated
//!
//! `ParserConfig` derives serde so it can be embedded in application config
//! files; the `json` and `yaml` features add string loaders.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CsvError, Result};
use crate::reader::TextEncoding;

/// Default upper bound for a single line, in decoded characters.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 2048;

/// Default capacity of the threaded work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Default number of records decoded per batch by the threaded iterator.
pub const DEFAULT_THREADED_BATCH_SIZE: usize = 64;

/// The parser's behaviour when reading the first row of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// The file does not contain a header row.
    None,
    /// The first row names the columns; bindings are matched by name.
    #[default]
    ParseAndBind,
    /// The first row is a header that is discarded; bindings come from
    /// declared or implicit column indices.
    SkipUnbound,
}

impl FromStr for HeaderMode {
    type Err = CsvError;

    /// Case-insensitive; accepts the short forms `parse` and `skip`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(HeaderMode::None),
            "parse" | "parse_and_bind" => Ok(HeaderMode::ParseAndBind),
            "skip" | "skip_unbound" => Ok(HeaderMode::SkipUnbound),
            _ => Err(CsvError::configuration(format!("Unknown header mode '{s}'"))),
        }
    }
}

/// Options used by the CSV parser.
///
/// Derive variants with the `with_*` methods or struct update syntax:
///
/// ```rust
/// use csvbind::{HeaderMode, ParserConfig};
///
/// let cfg = ParserConfig::default()
///     .with_separator(';')
///     .with_header_mode(HeaderMode::None);
/// let threaded = ParserConfig { multithreaded: true, ..cfg.clone() };
/// assert_eq!(threaded.separator, ';');
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Whether plain struct fields participate in binding
    pub include_fields: bool,
    /// Whether accessor-pair properties participate in binding
    pub include_properties: bool,
    /// Whether private members participate in binding
    pub include_private: bool,
    /// Whether quoted fields are unescaped
    pub quote_handling: bool,
    /// Separator between fields
    pub separator: char,
    /// Fixed upper bound on a line's length; longer lines are truncated
    pub max_line_length: usize,
    /// Treatment of the first row
    pub header_mode: HeaderMode,
    /// Encoding label used when no byte-order mark is present
    pub encoding: Option<String>,
    /// Decode rows on a pool of worker threads
    pub multithreaded: bool,
    /// Parse floats with the lexical fast path instead of `str::parse`
    pub fast_numeric_parsing: bool,
    /// Number of worker threads; defaults to available parallelism minus one
    pub worker_threads: Option<usize>,
    /// Capacity of the threaded work queue, rounded up to a power of two
    pub queue_capacity: usize,
    /// Records per batch when iterating a threaded session lazily
    pub threaded_batch_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            include_fields: true,
            include_properties: true,
            include_private: false,
            quote_handling: false,
            separator: ',',
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            header_mode: HeaderMode::default(),
            encoding: None,
            multithreaded: false,
            fast_numeric_parsing: true,
            worker_threads: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            threaded_batch_size: DEFAULT_THREADED_BATCH_SIZE,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_fields(mut self, include: bool) -> Self {
        self.include_fields = include;
        self
    }

    pub fn with_include_properties(mut self, include: bool) -> Self {
        self.include_properties = include;
        self
    }

    pub fn with_include_private(mut self, include: bool) -> Self {
        self.include_private = include;
        self
    }

    pub fn with_quote_handling(mut self, enabled: bool) -> Self {
        self.quote_handling = enabled;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    pub fn with_header_mode(mut self, mode: HeaderMode) -> Self {
        self.header_mode = mode;
        self
    }

    /// Set the fallback encoding by label, e.g. `"windows-1252"` or `"utf-16le"`.
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn with_multithreaded(mut self, enabled: bool) -> Self {
        self.multithreaded = enabled;
        self
    }

    pub fn with_fast_numeric_parsing(mut self, enabled: bool) -> Self {
        self.fast_numeric_parsing = enabled;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_threaded_batch_size(mut self, size: usize) -> Self {
        self.threaded_batch_size = size;
        self
    }

    /// Check the options for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_line_length == 0 {
            return Err(CsvError::configuration(
                "max_line_length must be greater than zero",
            ));
        }
        if matches!(self.separator, '\r' | '\n') {
            return Err(CsvError::configuration(
                "separator cannot be a line terminator",
            ));
        }
        if self.quote_handling && self.separator == '"' {
            return Err(CsvError::configuration(
                "separator cannot be '\"' while quote handling is enabled",
            ));
        }
        if self.queue_capacity == 0 || self.threaded_batch_size == 0 {
            return Err(CsvError::configuration(
                "queue_capacity and threaded_batch_size must be greater than zero",
            ));
        }
        self.resolve_encoding()?;
        Ok(())
    }

    /// Resolve the configured encoding label, if any.
    pub fn resolve_encoding(&self) -> Result<Option<TextEncoding>> {
        match &self.encoding {
            None => Ok(None),
            Some(label) => TextEncoding::for_label(label).map(Some).ok_or_else(|| {
                CsvError::configuration(format!("Unknown encoding label '{label}'"))
            }),
        }
    }

    /// Number of worker threads a threaded session spawns.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get().saturating_sub(1))
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Parse a configuration from JSON.
    #[cfg(feature = "json")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| CsvError {
            source: Some(Box::new(e)),
            ..CsvError::configuration("invalid JSON parser configuration")
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s).map_err(|e| CsvError {
            source: Some(Box::new(e)),
            ..CsvError::configuration("invalid YAML parser configuration")
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}
