//! Tests for records declared through `csv_record!`.

use crate::binding::{BindingTable, CustomSerializer, FieldSet, MemberKind, ValueKind};
use crate::config::ParserConfig;
use crate::error::ConversionError;

struct Percent;

impl CustomSerializer<f64> for Percent {
    fn deserialize(&self, text: &str, _line: usize) -> Result<f64, ConversionError> {
        let digits = text.trim().trim_end_matches('%');
        digits
            .parse::<f64>()
            .map(|v| v / 100.0)
            .map_err(ConversionError::custom)
    }

    fn serialize(&self, value: &f64, out: &mut String) -> Result<(), ConversionError> {
        out.push_str(&format!("{}%", value * 100.0));
        Ok(())
    }
}

crate::csv_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Position {
        #[csv(name = "Ticker")]
        pub symbol: String,
        #[csv(index = 4)]
        pub quantity: i64,
        #[csv(skip)]
        pub note: String,
        #[csv(serializer = Percent)]
        pub weight: f64,
        #[csv(name = "Desk", index = 6)]
        pub desk: Option<u16>,
        internal: u32,
    }
}

#[test]
fn declares_every_member_in_order() {
    let fields = FieldSet::<Position>::of();
    let members: Vec<&str> = fields.iter().map(|d| d.member()).collect();
    assert_eq!(
        members,
        vec!["symbol", "quantity", "note", "weight", "desk", "internal"]
    );
    assert!(fields.iter().all(|d| d.member_kind() == MemberKind::Field));
}

#[test]
fn attribute_options_reach_the_descriptor() {
    let fields = FieldSet::<Position>::of();
    let by_name = |name: &str| fields.iter().find(|d| d.member() == name).unwrap();

    assert_eq!(by_name("symbol").column_name(), "Ticker");
    assert_eq!(by_name("quantity").column_index(), Some(4));
    assert!(by_name("note").is_skipped());
    assert_eq!(by_name("weight").value_kind(), ValueKind::Custom);
    assert_eq!(by_name("desk").column_name(), "Desk");
    assert_eq!(by_name("desk").column_index(), Some(6));
    assert_eq!(by_name("desk").type_name(), "Option<u16>");
}

#[test]
fn non_pub_fields_are_private() {
    let table = BindingTable::<Position>::build(&ParserConfig::default()).unwrap();
    assert_eq!(table.column_names(), vec!["Ticker", "weight", "quantity", "Desk"]);

    let with_private =
        BindingTable::<Position>::build(&ParserConfig::default().with_include_private(true))
            .unwrap();
    // internal takes ordinal 5.
    assert_eq!(with_private.get(5).map(|b| b.member()), Some("internal"));
}

#[test]
fn serializer_formats_the_member() {
    let table = BindingTable::<Position>::build(&ParserConfig::default()).unwrap();
    let position = Position {
        symbol: "ACME".into(),
        quantity: 10,
        weight: 0.25,
        desk: Some(3),
        ..Position::default()
    };

    let mut row = String::new();
    table.format_row(&position, &mut row).unwrap();
    assert_eq!(row, "ACME,,,25%,10,,3");

    let weight = table.get(3).unwrap();
    assert!(weight.has_custom_serializer());
    let mut parsed = Position::default();
    weight
        .parse(&mut parsed, "50%", 1, &Default::default())
        .unwrap();
    assert_eq!(parsed.weight, 0.5);
}
