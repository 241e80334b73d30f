//! Tests for error construction and display.

use std::error::Error;
use std::io;

use crate::error::{ConversionError, CsvError, ErrorKind};

#[test]
fn configuration_errors_have_no_line() {
    let err = CsvError::configuration("bad option");
    assert!(err.is(ErrorKind::Configuration));
    assert!(!err.is(ErrorKind::Io));
    assert_eq!(err.line, None);
    assert_eq!(err.to_string(), "[Configuration] bad option");
    assert!(err.source().is_none());
}

#[test]
fn malformed_quoting_names_line_and_text() {
    let err = CsvError::malformed_quoting(12, "a,\"b\"c");
    assert!(err.is(ErrorKind::MalformedQuoting));
    assert_eq!(err.line, Some(12));
    assert!(err.message.starts_with("Illegal quotation mark found"));
    assert!(err.message.contains("At line number 12"));
    assert!(err.message.ends_with("a,\"b\"c"));
}

#[test]
fn field_conversion_keeps_the_cause() {
    let cause = "x".parse::<i32>().unwrap_err();
    let err = CsvError::field_conversion("qty", "i32", 3, "x,y", ConversionError::from(cause));

    assert!(err.is(ErrorKind::FieldConversion));
    assert_eq!(err.line, Some(3));
    assert_eq!(
        err.message,
        "Value of 'x,y' couldn't be parsed as a i32 qty! At line number 3."
    );
    let source = err.source().unwrap();
    assert!(source.to_string().starts_with("invalid integer"));
}

#[test]
fn io_errors_convert() {
    let err: CsvError = io::Error::new(io::ErrorKind::UnexpectedEof, "truncated").into();
    assert!(err.is(ErrorKind::Io));
    assert_eq!(err.line, None);
    assert_eq!(err.to_string(), "[Io] I/O error: truncated");

    let err = CsvError::io(Some(9), io::Error::other("disk"));
    assert_eq!(err.line, Some(9));
    assert!(err.source().is_some());
}

#[test]
fn conversion_error_messages() {
    assert_eq!(ConversionError::Empty.to_string(), "empty value");
    assert_eq!(
        ConversionError::NotAChar("ab".into()).to_string(),
        "expected a single character, found \"ab\""
    );
    assert_eq!(
        ConversionError::Discriminant {
            type_name: "Side",
            value: "9".into(),
        }
        .to_string(),
        "9 is not a valid Side discriminant"
    );
    assert_eq!(ConversionError::custom(42).to_string(), "42");
}

#[test]
fn csv_error_is_send_and_sync() {
    fn assert_send_sync<E: Send + Sync + 'static>() {}
    assert_send_sync::<CsvError>();
    assert_send_sync::<ConversionError>();
}

#[cfg(feature = "miette")]
#[test]
fn converts_into_a_diagnostic() {
    use crate::error::CsvDiagnostic;

    let diag = CsvDiagnostic::from(CsvError::malformed_quoting(4, "\"a\"b"));
    assert!(diag.message.starts_with("[MalformedQuoting] line 4:"));
    assert!(diag.help.is_some());
}
