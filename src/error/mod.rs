//! Error types for csvbind parsing operations.
//!
//! This module provides:
//! - `ErrorKind`: Which class of failure occurred
//! - `CsvError`: The single structured error surfaced to callers
//! - `ConversionError`: The underlying failure when a field value cannot be parsed

use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Binding-table construction or configuration validation failed
    Configuration,
    /// A quote appeared in the middle of a quoted field
    MalformedQuoting,
    /// A non-nullable field could not be parsed
    FieldConversion,
    /// Reading from the byte source failed
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration"),
            ErrorKind::MalformedQuoting => write!(f, "MalformedQuoting"),
            ErrorKind::FieldConversion => write!(f, "FieldConversion"),
            ErrorKind::Io => write!(f, "Io"),
        }
    }
}

/// A parse failure with context.
///
/// Every error the engine raises is a `CsvError`; `kind` tells the classes
/// apart and `line` carries the 1-based physical line number when the error
/// is tied to a row.
#[derive(Debug)]
pub struct CsvError {
    /// Class of failure
    pub kind: ErrorKind,
    /// 1-based line number in the source, if the error belongs to a row
    pub line: Option<usize>,
    /// Human-readable description
    pub message: String,
    /// The underlying error, if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for CsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl CsvError {
    /// Create a configuration error, raised before any row is read.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Configuration,
            line: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed-quoting error for the given 1-based line.
    pub fn malformed_quoting(line_no: usize, raw_line: &str) -> Self {
        Self {
            kind: ErrorKind::MalformedQuoting,
            line: Some(line_no),
            message: format!(
                "Illegal quotation mark found, quotation marks can only appear at the start or end of fields. \
                 At line number {line_no} line: \n{raw_line}"
            ),
            source: None,
        }
    }

    /// Wrap a conversion failure on a non-nullable field.
    pub fn field_conversion(
        field: &str,
        type_name: &str,
        line_no: usize,
        raw_line: &str,
        source: ConversionError,
    ) -> Self {
        Self {
            kind: ErrorKind::FieldConversion,
            line: Some(line_no),
            message: format!(
                "Value of '{raw_line}' couldn't be parsed as a {type_name} {field}! At line number {line_no}."
            ),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an I/O failure from the byte source.
    pub fn io(line: Option<usize>, error: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            line,
            message: format!("I/O error: {error}"),
            source: Some(Box::new(error)),
        }
    }

    /// Check whether this error belongs to the given class.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for CsvError {
    fn from(error: std::io::Error) -> Self {
        Self::io(None, error)
    }
}

/// Errors raised while converting a single field's text into its value.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),

    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),

    /// Raised by the fast numeric path
    #[error("invalid number: {0}")]
    Lexical(lexical_core::Error),

    #[error("invalid decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),

    /// The field was empty but the type needs at least one character
    #[error("empty value")]
    Empty,

    /// The integer does not name a variant of the enum
    #[error("{value} is not a valid {type_name} discriminant")]
    Discriminant {
        type_name: &'static str,
        value: String,
    },

    /// The field held more than one character for a `char` member
    #[error("expected a single character, found {0:?}")]
    NotAChar(String),

    /// Raised by a user type or custom serializer
    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// Create a custom conversion error from any displayable message.
    pub fn custom(message: impl fmt::Display) -> Self {
        ConversionError::Custom(message.to_string())
    }
}

/// Shorthand result type used across the crate.
pub type Result<T, E = CsvError> = std::result::Result<T, E>;

#[cfg(feature = "miette")]
mod miette_impl;

#[cfg(feature = "miette")]
pub use miette_impl::*;
