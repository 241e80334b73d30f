//! Tests for quoted-field unescaping.

use crate::binding::BindingTable;
use crate::config::ParserConfig;
use crate::decode::RowDecoder;
use crate::error::ErrorKind;

crate::csv_record! {
    #[derive(Debug, Default, PartialEq)]
    pub struct Pair {
        pub left: String,
        pub right: String,
    }
}

fn decode_with(cfg: ParserConfig, line: &str) -> crate::error::Result<Pair> {
    let table = BindingTable::<Pair>::build(&cfg)?;
    let mut pair = Pair::default();
    RowDecoder::default().decode(&mut pair, line, 5, &table)?;
    Ok(pair)
}

fn decode(line: &str) -> crate::error::Result<Pair> {
    decode_with(ParserConfig::default().with_quote_handling(true), line)
}

fn pair(left: &str, right: &str) -> Pair {
    Pair {
        left: left.into(),
        right: right.into(),
    }
}

#[test]
fn quoted_field_may_contain_the_separator() {
    assert_eq!(decode("\"a,b\",x").unwrap(), pair("a,b", "x"));
}

#[test]
fn doubled_quotes_are_literal() {
    assert_eq!(decode("\"\"\"a,b\"\"\",x").unwrap(), pair("\"a,b\"", "x"));
    assert_eq!(decode("\"say \"\"hi\"\"\",x").unwrap(), pair("say \"hi\"", "x"));
}

#[test]
fn quoted_field_at_end_of_line() {
    assert_eq!(decode("x,\"tail\"").unwrap(), pair("x", "tail"));
    assert_eq!(decode("\"\",\"\"").unwrap(), pair("", ""));
}

#[test]
fn unquoted_fields_pass_through() {
    assert_eq!(decode("plain,text").unwrap(), pair("plain", "text"));
}

#[test]
fn stray_quote_after_closing_is_malformed() {
    let err = decode("\"ab\"c,x").unwrap_err();
    assert!(err.is(ErrorKind::MalformedQuoting));
    assert_eq!(err.line, Some(5));
    assert!(err.message.contains("At line number 5"));
    assert!(err.message.contains("\"ab\"c,x"));
}

#[test]
fn unterminated_quote_runs_to_end_of_line() {
    assert_eq!(decode("\"open, never closed").unwrap(), pair("open, never closed", ""));
}

#[test]
fn quotes_are_literal_when_handling_is_off() {
    let p = decode_with(ParserConfig::default(), "\"a\",\"b\"").unwrap();
    assert_eq!(p, pair("\"a\"", "\"b\""));
}

#[test]
fn quoting_with_a_multibyte_separator() {
    let cfg = ParserConfig::default()
        .with_quote_handling(true)
        .with_separator('§');
    let p = decode_with(cfg, "\"a§b\"§ok").unwrap();
    assert_eq!(p, pair("a§b", "ok"));
}

#[test]
fn matches_the_csv_crate_on_quoted_input() {
    let line = "\"x \"\"quoted\"\", y\",\"second\"";
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(line.as_bytes());
    let record = reader.records().next().unwrap().unwrap();

    let p = decode(line).unwrap();
    assert_eq!(p.left, &record[0]);
    assert_eq!(p.right, &record[1]);
}
