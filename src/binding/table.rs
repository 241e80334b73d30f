use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::descriptor::{FieldDescriptor, FieldSet, FormatFn, MemberKind, ParseFn, UnsetFn, Visibility};
use super::value::{ParseOptions, ValueKind};
use super::CsvRecord;
use crate::config::ParserConfig;
use crate::error::{ConversionError, CsvError, Result};

/// The compiled binding of one record member to one column.
///
/// Built once per parser and shared read-only by every worker.
pub struct FieldBinding<T> {
    name: String,
    member: &'static str,
    member_kind: MemberKind,
    value_kind: ValueKind,
    type_name: &'static str,
    nullable: bool,
    custom: bool,
    parse: Box<ParseFn<T>>,
    format: Box<FormatFn<T>>,
    unset: Box<UnsetFn<T>>,
}

impl<T> FieldBinding<T> {
    fn compile(desc: FieldDescriptor<T>) -> Result<Self> {
        let name = desc.column_name().to_string();
        let accessors = desc.accessors.map_err(CsvError::configuration)?;
        Ok(Self {
            name,
            member: desc.member,
            member_kind: desc.member_kind,
            value_kind: desc.value_kind,
            type_name: desc.type_name,
            nullable: desc.nullable,
            custom: desc.custom,
            parse: accessors.parse,
            format: accessors.format,
            unset: accessors.unset,
        })
    }

    /// The header name this binding matches.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self) -> &'static str {
        self.member
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

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_custom_serializer(&self) -> bool {
        self.custom
    }

    /// Parse `text` straight into the bound member of `record`.
    #[inline]
    pub fn parse(
        &self,
        record: &mut T,
        text: &str,
        line_no: usize,
        opts: &ParseOptions,
    ) -> std::result::Result<(), ConversionError> {
        (self.parse)(record, text, line_no, opts)
    }

    #[inline]
    pub fn unset(&self, record: &mut T) {
        (self.unset)(record)
    }

    pub fn format(&self, record: &T, out: &mut String) -> std::result::Result<(), ConversionError> {
        (self.format)(record, out)
    }
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("member", &self.member)
            .field("value_kind", &self.value_kind)
            .field("type_name", &self.type_name)
            .field("nullable", &self.nullable)
            .field("custom", &self.custom)
            .finish()
    }
}

/// Column-aligned bindings: entry `i` binds column `i`, `None` leaves the
/// column unbound.
pub struct BindingTable<T> {
    columns: Vec<Option<Arc<FieldBinding<T>>>>,
    separator: char,
    quote_handling: bool,
}

impl<T> Clone for BindingTable<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            separator: self.separator,
            quote_handling: self.quote_handling,
        }
    }
}

impl<T: CsvRecord> BindingTable<T> {
    /// Build the declared table for `T`.
    ///
    /// Fields are considered before properties, each in registration order.
    /// Every eligible member takes the next ordinal, skipped ones included;
    /// an explicit index replaces the ordinal. Two members claiming the same
    /// column is a configuration error.
    pub fn build(config: &ParserConfig) -> Result<Self> {
        let (fields, properties): (Vec<_>, Vec<_>) = FieldSet::<T>::of()
            .into_members()
            .into_iter()
            .partition(|d| d.member_kind == MemberKind::Field);

        let mut groups = Vec::with_capacity(2);
        if config.include_fields {
            groups.push(fields);
        }
        if config.include_properties {
            groups.push(properties);
        }

        let mut placed: Vec<(usize, FieldBinding<T>)> = Vec::new();
        let mut ordinal = 0usize;
        for desc in groups.into_iter().flatten() {
            if desc.visibility == Visibility::Private && !config.include_private {
                continue;
            }
            let slot = ordinal;
            ordinal += 1;
            if desc.skip {
                continue;
            }
            let index = desc.column_index.unwrap_or(slot);
            placed.push((index, FieldBinding::compile(desc)?));
        }

        placed.sort_by_key(|(index, _)| *index);
        for pair in placed.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(CsvError::configuration(format!(
                    "Members '{}' and '{}' are both bound to column {}",
                    pair[0].1.member, pair[1].1.member, pair[0].0
                )));
            }
        }

        let width = placed.last().map_or(0, |(index, _)| index + 1);
        let mut columns: Vec<Option<Arc<FieldBinding<T>>>> = Vec::with_capacity(width);
        for (index, binding) in placed {
            columns.resize_with(index, || None);
            columns.push(Some(Arc::new(binding)));
        }

        Ok(Self {
            columns,
            separator: config.separator,
            quote_handling: config.quote_handling,
        })
    }
}

impl<T> BindingTable<T> {
    /// Re-align the bindings to a header row, matching column names exactly.
    ///
    /// A leading U+FEFF is ignored. Columns that match no binding are left
    /// unbound; bindings that match no column are dropped.
    pub fn bind_header(&self, header: &str) -> Self {
        let header = header.strip_prefix('\u{FEFF}').unwrap_or(header);
        let mut columns = Vec::new();
        let mut rest = header;

        while !rest.is_empty() {
            let (name, next) = match rest.find(self.separator) {
                Some(end) => (&rest[..end], Some(&rest[end + self.separator.len_utf8()..])),
                None => (rest, None),
            };
            let matched = self
                .columns
                .iter()
                .flatten()
                .find(|binding| binding.name == name)
                .cloned();
            columns.push(matched);
            match next {
                Some(next) => rest = next,
                None => break,
            }
        }

        let table = Self {
            columns,
            separator: self.separator,
            quote_handling: self.quote_handling,
        };
        debug!(
            columns = table.len(),
            bound = table.bound_count(),
            "bound header row"
        );
        table
    }

    /// Number of columns, bound or not.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn bound_count(&self) -> usize {
        self.columns.iter().flatten().count()
    }

    pub fn get(&self, column: usize) -> Option<&FieldBinding<T>> {
        self.columns.get(column).and_then(|b| b.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&FieldBinding<T>>> {
        self.columns.iter().map(|b| b.as_deref())
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn quote_handling(&self) -> bool {
        self.quote_handling
    }

    /// Names of the bound columns, in column order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flatten()
            .map(|binding| binding.name.clone())
            .collect()
    }

    /// Append a header row naming every column; unbound columns are empty.
    pub fn format_header(&self, out: &mut String) {
        for (i, binding) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            if let Some(binding) = binding {
                self.push_field(out, &binding.name);
            }
        }
    }

    /// Append `record` as one row using each binding's format routine.
    ///
    /// With quote handling on, fields containing the separator, a quote or a
    /// line terminator are quoted and their quotes doubled.
    pub fn format_row(&self, record: &T, out: &mut String) -> std::result::Result<(), ConversionError> {
        let mut scratch = String::new();
        for (i, binding) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            if let Some(binding) = binding {
                scratch.clear();
                binding.format(record, &mut scratch)?;
                self.push_field(out, &scratch);
            }
        }
        Ok(())
    }

    fn push_field(&self, out: &mut String, text: &str) {
        let needs_quotes = self.quote_handling
            && text
                .chars()
                .any(|c| c == self.separator || matches!(c, '"' | '\r' | '\n'));
        if needs_quotes {
            out.push('"');
            for c in text.chars() {
                if c == '"' {
                    out.push('"');
                }
                out.push(c);
            }
            out.push('"');
        } else {
            out.push_str(text);
        }
    }
}

impl<T> fmt::Debug for BindingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("columns", &self.columns)
            .field("separator", &self.separator)
            .field("quote_handling", &self.quote_handling)
            .finish()
    }
}
