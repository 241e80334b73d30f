//! Miette integration for pretty error reporting.

use miette::{Diagnostic, Severity};
use thiserror::Error;

use super::{CsvError, ErrorKind};

/// A diagnostic wrapper for parse errors compatible with miette.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct CsvDiagnostic {
    /// The error message
    pub message: String,

    #[source]
    /// The underlying error source
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,

    #[help]
    /// Help text for the user
    pub help: Option<String>,

    #[diagnostic(severity)]
    /// Severity level
    pub severity: Severity,
}

fn help_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Configuration => "Check the record's field attributes and the parser configuration",
        ErrorKind::MalformedQuoting => {
            "Quotes inside a quoted field must be doubled; enable quote handling only for RFC-4180 style files"
        }
        ErrorKind::FieldConversion => {
            "Wrap the field in Option<_> to leave unparsable values unset instead of failing"
        }
        ErrorKind::Io => "Check that the byte source is readable",
    }
}

impl From<CsvError> for CsvDiagnostic {
    fn from(e: CsvError) -> Self {
        let message = match e.line {
            Some(line) => format!("[{}] line {}: {}", e.kind, line, e.message),
            None => format!("[{}] {}", e.kind, e.message),
        };
        CsvDiagnostic {
            message,
            source: e.source,
            help: Some(help_for(e.kind).into()),
            severity: Severity::Error,
        }
    }
}

impl From<CsvError> for miette::Report {
    fn from(e: CsvError) -> Self {
        miette::Report::new(CsvDiagnostic::from(e))
    }
}
