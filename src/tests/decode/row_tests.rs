//! Tests for splitting rows and assigning fields.

use crate::binding::{BindingTable, CustomSerializer, DisplayFormatted, ParseOptions};
use crate::config::{HeaderMode, ParserConfig};
use crate::decode::RowDecoder;
use crate::error::{ConversionError, ErrorKind};

crate::csv_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Reading {
        pub sensor: String,
        pub value: f64,
        pub count: Option<i32>,
        pub ok: bool,
    }
}

fn table(cfg: &ParserConfig) -> BindingTable<Reading> {
    BindingTable::build(cfg).unwrap()
}

fn decode(line: &str) -> crate::error::Result<Reading> {
    let mut record = Reading::default();
    RowDecoder::default().decode(&mut record, line, 1, &table(&ParserConfig::default()))?;
    Ok(record)
}

#[test]
fn decodes_a_simple_row() {
    let r = decode("probe-1,21.5,3,true").unwrap();
    assert_eq!(
        r,
        Reading {
            sensor: "probe-1".into(),
            value: 21.5,
            count: Some(3),
            ok: true,
        }
    );
}

#[test]
fn short_rows_leave_members_untouched() {
    let r = decode("probe-2,1.25").unwrap();
    assert_eq!(r.sensor, "probe-2");
    assert_eq!(r.value, 1.25);
    assert_eq!(r.count, None);
    assert!(!r.ok);
}

#[test]
fn extra_columns_are_ignored() {
    let r = decode("a,1,2,1,surplus,more").unwrap();
    assert_eq!(r.count, Some(2));
    assert!(r.ok);
}

#[test]
fn empty_nullable_field_is_unset() {
    let mut record = Reading {
        count: Some(99),
        ..Reading::default()
    };
    RowDecoder::default()
        .decode(&mut record, "x,0,,1", 1, &table(&ParserConfig::default()))
        .unwrap();
    assert_eq!(record.count, None);
}

#[test]
fn leading_empty_nullable_column() {
    crate::csv_record! {
        #[derive(Debug, Default)]
        pub struct Counts {
            pub first: Option<i32>,
            pub second: Option<i32>,
        }
    }

    let t = BindingTable::<Counts>::build(&ParserConfig::default()).unwrap();
    let mut counts = Counts {
        first: Some(1),
        second: None,
    };
    RowDecoder::default().decode(&mut counts, ",5", 2, &t).unwrap();
    assert_eq!(counts.first, None);
    assert_eq!(counts.second, Some(5));
}

#[test]
fn unparsable_nullable_field_is_unset() {
    let r = decode("x,0,lots,0").unwrap();
    assert_eq!(r.count, None);
}

#[test]
fn unparsable_required_field_reports_member_and_line() {
    let mut record = Reading::default();
    let err = RowDecoder::default()
        .decode(&mut record, "x,warm,1,1", 42, &table(&ParserConfig::default()))
        .unwrap_err();

    assert!(err.is(ErrorKind::FieldConversion));
    assert_eq!(err.line, Some(42));
    assert!(err.message.contains("value"), "{}", err.message);
    assert!(err.message.contains("f64"), "{}", err.message);
    assert!(err.message.contains("At line number 42"), "{}", err.message);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn standard_numeric_path_matches_fast_path() {
    let t = table(&ParserConfig::default());
    let mut fast = Reading::default();
    let mut slow = Reading::default();
    RowDecoder::new(ParseOptions { fast_numeric: true })
        .decode(&mut fast, "s,0.1,-7,1", 1, &t)
        .unwrap();
    RowDecoder::new(ParseOptions {
        fast_numeric: false,
    })
    .decode(&mut slow, "s,0.1,-7,1", 1, &t)
    .unwrap();
    assert_eq!(fast, slow);
}

#[test]
fn honours_a_tab_separator() {
    let t = table(&ParserConfig::default().with_separator('\t'));
    let mut r = Reading::default();
    RowDecoder::default()
        .decode(&mut r, "a,b\t2.5\t\tTRUE", 1, &t)
        .unwrap();
    assert_eq!(r.sensor, "a,b");
    assert_eq!(r.value, 2.5);
    assert_eq!(r.count, None);
    assert!(r.ok);
}

#[test]
fn honours_a_multibyte_separator() {
    let t = table(&ParserConfig::default().with_separator('¦'));
    let mut r = Reading::default();
    RowDecoder::default().decode(&mut r, "é¦3¦4¦1", 1, &t).unwrap();
    assert_eq!(r.sensor, "é");
    assert_eq!(r.value, 3.0);
    assert_eq!(r.count, Some(4));
}

#[test]
fn header_bound_table_follows_header_order() {
    let cfg = ParserConfig::default().with_header_mode(HeaderMode::ParseAndBind);
    let t = table(&cfg).bind_header("ok,unknown,sensor");
    let mut r = Reading::default();
    RowDecoder::default()
        .decode(&mut r, "1,ignored,probe-9,5.0", 3, &t)
        .unwrap();
    assert!(r.ok);
    assert_eq!(r.sensor, "probe-9");
    assert_eq!(r.value, 0.0);
}

/// Parses `hh:mm:ss` into seconds.
struct TimeOfDay;

impl CustomSerializer<u32> for TimeOfDay {
    fn deserialize(&self, text: &str, line: usize) -> Result<u32, ConversionError> {
        let mut parts = text.split(':').map(str::parse::<u32>);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) => Ok(h * 3600 + m * 60 + s),
            _ => Err(ConversionError::custom(format!(
                "bad time {text:?} on line {line}"
            ))),
        }
    }
}

crate::csv_record! {
    #[derive(Debug, Default)]
    pub struct Shift {
        #[csv(serializer = TimeOfDay)]
        pub start: u32,
        #[csv(serializer = TimeOfDay)]
        pub end: u32,
    }
}

#[test]
fn custom_serializers_convert_fields() {
    let t = BindingTable::<Shift>::build(&ParserConfig::default()).unwrap();
    let mut shift = Shift::default();
    RowDecoder::default()
        .decode(&mut shift, "10:30:00,11:45:15", 1, &t)
        .unwrap();
    assert_eq!(shift.start, 37_800);
    assert_eq!(shift.end, 42_315);
}

#[test]
fn custom_serializer_failures_are_conversion_errors() {
    let t = BindingTable::<Shift>::build(&ParserConfig::default()).unwrap();
    let mut shift = Shift::default();
    let err = RowDecoder::default()
        .decode(&mut shift, "10:30:00,noon", 7, &t)
        .unwrap_err();
    assert!(err.is(ErrorKind::FieldConversion));
    assert_eq!(err.line, Some(7));
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert_eq!(source, "bad time \"noon\" on line 7");
}

crate::csv_record! {
    #[derive(Debug, Default)]
    pub struct Break {
        #[csv(serializer = DisplayFormatted(TimeOfDay))]
        pub at: u32,
        pub label: String,
    }
}

#[test]
fn display_formatted_serializers_write_rows() {
    let t = BindingTable::<Break>::build(&ParserConfig::default()).unwrap();
    let mut lunch = Break::default();
    RowDecoder::default()
        .decode(&mut lunch, "12:00:00,lunch", 1, &t)
        .unwrap();
    assert_eq!(lunch.at, 43_200);

    let mut out = String::new();
    t.format_row(&lunch, &mut out).unwrap();
    assert_eq!(out, "43200,lunch");
}

#[test]
fn deserialize_only_serializers_refuse_to_format() {
    let t = BindingTable::<Shift>::build(&ParserConfig::default()).unwrap();
    let mut out = String::new();
    assert!(t.format_row(&Shift::default(), &mut out).is_err());
}
