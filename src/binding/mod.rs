//! Field binding and accessor compilation.
//!
//! This module provides:
//! - `CsvField`: Parse/format routines for every supported member type
//! - `CsvRecord` / `FieldSet`: How a record type registers its members
//! - `CustomSerializer`: Per-member conversion overrides
//! - `BindingTable`: Column-aligned compiled bindings, from declarations or a header
//! - `ReusableField`: Fixed-capacity string that is overwritten in place
//!
//! Record types are usually declared with [`csv_record!`](crate::csv_record);
//! enums with [`csv_enum!`](crate::csv_enum) and other `FromStr` types with
//! [`csv_from_str!`](crate::csv_from_str).

mod descriptor;
mod macros;
mod reusable;
mod table;
mod value;

pub use descriptor::{CsvRecord, CustomSerializer, DisplayFormatted, FieldDescriptor, FieldSet, MemberKind, Visibility};
pub use reusable::{DEFAULT_REUSABLE_CAPACITY, ReusableField};
pub use table::{BindingTable, FieldBinding};
pub use value::{CsvField, ParseOptions, ValueKind};
