//! Member descriptors: what a record type declares about its members.
//!
//! A record type lists its members once, in [`CsvRecord::describe`], by
//! handing accessor functions to a [`FieldSet`]. Each registration
//! monomorphises the parse/format/unset routines for that member's type and
//! stores them as boxed closures, so nothing is looked up per row.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use super::value::{CsvField, ParseOptions, ValueKind};
use crate::error::ConversionError;

/// Parses a field's text into a record; receives the 1-based line number.
pub(crate) type ParseFn<T> =
    dyn Fn(&mut T, &str, usize, &ParseOptions) -> Result<(), ConversionError> + Send + Sync;
pub(crate) type FormatFn<T> = dyn Fn(&T, &mut String) -> Result<(), ConversionError> + Send + Sync;
pub(crate) type UnsetFn<T> = dyn Fn(&mut T) + Send + Sync;

/// A record type whose rows can be decoded from CSV.
///
/// Usually implemented through [`csv_record!`](crate::csv_record); implement
/// it by hand to register accessor-pair properties or private members.
pub trait CsvRecord: Default + Send + 'static {
    /// Register every member, in declaration order.
    fn describe(fields: &mut FieldSet<Self>);
}

/// Replaces the default conversion of one member.
///
/// ```rust
/// use csvbind::{ConversionError, CustomSerializer};
///
/// struct Upper;
///
/// impl CustomSerializer<String> for Upper {
///     fn deserialize(&self, text: &str, _line: usize) -> Result<String, ConversionError> {
///         Ok(text.to_uppercase())
///     }
/// }
/// ```
pub trait CustomSerializer<V>: Send + Sync + 'static {
    /// Build a value from the field's text. `line` is the 1-based line number.
    fn deserialize(&self, text: &str, line: usize) -> Result<V, ConversionError>;

    /// Append the value's textual form to `out`.
    fn serialize(&self, value: &V, out: &mut String) -> Result<(), ConversionError> {
        let _ = (value, out);
        Err(ConversionError::custom(
            "this serializer does not support formatting",
        ))
    }
}

/// Gives a deserialize-only serializer a formatting side that writes the
/// value's `Display` form.
///
/// ```rust
/// use csvbind::{ConversionError, CustomSerializer, DisplayFormatted};
///
/// struct Hex;
///
/// impl CustomSerializer<u32> for Hex {
///     fn deserialize(&self, text: &str, _line: usize) -> Result<u32, ConversionError> {
///         u32::from_str_radix(text.trim_start_matches("0x"), 16).map_err(ConversionError::custom)
///     }
/// }
///
/// let mut out = String::new();
/// DisplayFormatted(Hex).serialize(&255u32, &mut out).unwrap();
/// assert_eq!(out, "255");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFormatted<S>(pub S);

impl<V, S> CustomSerializer<V> for DisplayFormatted<S>
where
    V: fmt::Display,
    S: CustomSerializer<V>,
{
    fn deserialize(&self, text: &str, line: usize) -> Result<V, ConversionError> {
        self.0.deserialize(text, line)
    }

    fn serialize(&self, value: &V, out: &mut String) -> Result<(), ConversionError> {
        write!(out, "{value}").map_err(ConversionError::custom)
    }
}

/// Whether a member is a plain field or an accessor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    /// Classify a visibility qualifier as written in source, e.g. `"pub"`.
    ///
    /// Only a bare `pub` counts as public; restricted forms such as
    /// `pub(crate)` are private to callers of the crate.
    pub fn from_tokens(tokens: &str) -> Self {
        if tokens.trim() == "pub" {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

pub(crate) struct Accessors<T> {
    pub(crate) parse: Box<ParseFn<T>>,
    pub(crate) format: Box<FormatFn<T>>,
    pub(crate) unset: Box<UnsetFn<T>>,
}

/// One registered member and its binding options.
pub struct FieldDescriptor<T> {
    pub(crate) member: &'static str,
    pub(crate) member_kind: MemberKind,
    pub(crate) visibility: Visibility,
    pub(crate) column_name: Option<String>,
    pub(crate) column_index: Option<usize>,
    pub(crate) skip: bool,
    pub(crate) value_kind: ValueKind,
    pub(crate) type_name: &'static str,
    pub(crate) nullable: bool,
    pub(crate) custom: bool,
    /// `Err` holds why the member cannot be bound
    pub(crate) accessors: Result<Accessors<T>, String>,
}

impl<T> FieldDescriptor<T> {
    /// Match this member against a header column with a different name.
    pub fn name(&mut self, column_name: impl Into<String>) -> &mut Self {
        self.column_name = Some(column_name.into());
        self
    }

    /// Bind this member to a fixed 0-based column index.
    pub fn index(&mut self, index: usize) -> &mut Self {
        self.column_index = Some(index);
        self
    }

    /// Leave this member out of every binding table.
    pub fn skip(&mut self) -> &mut Self {
        self.skip = true;
        self
    }

    pub fn visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.visibility = visibility;
        self
    }

    pub fn private(&mut self) -> &mut Self {
        self.visibility(Visibility::Private)
    }

    pub fn member(&self) -> &'static str {
        self.member
    }

    /// The header name this member matches: the declared name, else the
    /// member name.
    pub fn column_name(&self) -> &str {
        self.column_name.as_deref().unwrap_or(self.member)
    }

    pub fn column_index(&self) -> Option<usize> {
        self.column_index
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn member_kind(&self) -> MemberKind {
        self.member_kind
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("member", &self.member)
            .field("member_kind", &self.member_kind)
            .field("visibility", &self.visibility)
            .field("column_name", &self.column_name)
            .field("column_index", &self.column_index)
            .field("skip", &self.skip)
            .field("value_kind", &self.value_kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// The members of a record type, in registration order.
pub struct FieldSet<T> {
    members: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> FieldSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Collect the members `T` registers.
    pub fn of() -> Self
    where
        T: CsvRecord,
    {
        let mut set = Self::new();
        T::describe(&mut set);
        set
    }

    /// Register a plain field through a pair of projections.
    pub fn field<V: CsvField>(
        &mut self,
        member: &'static str,
        get_mut: fn(&mut T) -> &mut V,
        get: fn(&T) -> &V,
    ) -> &mut FieldDescriptor<T> {
        let accessors = Accessors {
            parse: Box::new(move |record: &mut T, text: &str, _line, opts: &ParseOptions| {
                get_mut(record).parse_into(text, opts)
            }),
            format: Box::new(move |record: &T, out: &mut String| {
                get(record).format(out);
                Ok(())
            }),
            unset: Box::new(move |record: &mut T| get_mut(record).set_unset()),
        };
        self.push::<V>(member, MemberKind::Field, V::KIND, V::NULLABLE, false, Ok(accessors))
    }

    /// Register a plain field converted by `serializer`.
    pub fn custom_field<V: Send + 'static, S: CustomSerializer<V>>(
        &mut self,
        member: &'static str,
        get_mut: fn(&mut T) -> &mut V,
        get: fn(&T) -> &V,
        serializer: S,
    ) -> &mut FieldDescriptor<T> {
        let ser = Arc::new(serializer);
        let fmt_ser = Arc::clone(&ser);
        let accessors = Accessors {
            parse: Box::new(move |record: &mut T, text: &str, line, _opts: &ParseOptions| {
                *get_mut(record) = ser.deserialize(text, line)?;
                Ok(())
            }),
            format: Box::new(move |record: &T, out: &mut String| {
                fmt_ser.serialize(get(record), out)
            }),
            unset: Box::new(|_: &mut T| {}),
        };
        self.push::<V>(member, MemberKind::Field, ValueKind::Custom, false, true, Ok(accessors))
    }

    /// Register an accessor pair. A property without a setter cannot be
    /// bound; building a table that includes it fails.
    pub fn property<V: CsvField>(
        &mut self,
        member: &'static str,
        get: fn(&T) -> V,
        set: Option<fn(&mut T, V)>,
    ) -> &mut FieldDescriptor<T> {
        let accessors = set.map(|set| Accessors {
            parse: Box::new(move |record: &mut T, text: &str, _line, opts: &ParseOptions| {
                let mut value = get(record);
                value.parse_into(text, opts)?;
                set(record, value);
                Ok(())
            }) as Box<ParseFn<T>>,
            format: Box::new(move |record: &T, out: &mut String| {
                get(record).format(out);
                Ok(())
            }),
            unset: Box::new(move |record: &mut T| {
                let mut value = get(record);
                value.set_unset();
                set(record, value);
            }),
        });
        let accessors = accessors.ok_or_else(|| unsupported_property::<V>(member));
        self.push::<V>(member, MemberKind::Property, V::KIND, V::NULLABLE, false, accessors)
    }

    /// Register an accessor pair converted by `serializer`.
    pub fn custom_property<V: Send + 'static, S: CustomSerializer<V>>(
        &mut self,
        member: &'static str,
        get: fn(&T) -> V,
        set: Option<fn(&mut T, V)>,
        serializer: S,
    ) -> &mut FieldDescriptor<T> {
        let ser = Arc::new(serializer);
        let accessors = set.map(|set| {
            let fmt_ser = Arc::clone(&ser);
            Accessors {
                parse: Box::new(move |record: &mut T, text: &str, line, _opts: &ParseOptions| {
                    let value = ser.deserialize(text, line)?;
                    set(record, value);
                    Ok(())
                }) as Box<ParseFn<T>>,
                format: Box::new(move |record: &T, out: &mut String| {
                    fmt_ser.serialize(&get(record), out)
                }),
                unset: Box::new(|_: &mut T| {}),
            }
        });
        let accessors = accessors.ok_or_else(|| unsupported_property::<V>(member));
        self.push::<V>(
            member,
            MemberKind::Property,
            ValueKind::Custom,
            false,
            true,
            accessors,
        )
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor<T>> {
        self.members.iter()
    }

    pub(crate) fn into_members(self) -> Vec<FieldDescriptor<T>> {
        self.members
    }

    fn push<V>(
        &mut self,
        member: &'static str,
        member_kind: MemberKind,
        value_kind: ValueKind,
        nullable: bool,
        custom: bool,
        accessors: Result<Accessors<T>, String>,
    ) -> &mut FieldDescriptor<T> {
        self.members.push(FieldDescriptor {
            member,
            member_kind,
            visibility: Visibility::Public,
            column_name: None,
            column_index: None,
            skip: false,
            value_kind,
            type_name: short_type_name(std::any::type_name::<V>()),
            nullable,
            custom,
            accessors,
        });
        let last = self.members.len() - 1;
        &mut self.members[last]
    }
}

impl<T> std::fmt::Debug for FieldSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.members.iter()).finish()
    }
}

fn unsupported_property<V>(member: &str) -> String {
    format!(
        "Property '{member}' of type {} is not supported! It has no setter.",
        short_type_name(std::any::type_name::<V>())
    )
}

/// Strip module paths from a type name: `core::option::Option<i32>` becomes
/// `Option<i32>`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    // Generic names keep their arguments; only the outer path is stripped.
    let head_end = full.find('<').unwrap_or(full.len());
    match full[..head_end].rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}
