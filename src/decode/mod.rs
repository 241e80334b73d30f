//! Row decoding: one line of text into one record.
//!
//! Fields are split on the table's separator and handed, column by column,
//! to the bound member's parse routine. With quote handling on, a field that
//! starts with `"` is unescaped into a scratch buffer first:
//!
//! - `""` inside the field is a literal quote
//! - a quote followed by the separator, a line terminator or the end of the
//!   line closes the field
//! - a quote followed by anything else is malformed
//! - a field with no closing quote runs to the end of the line
//!
//! Columns past the end of the table are ignored; columns missing from a
//! short row leave their members untouched.

use memchr::memchr;

use crate::binding::{BindingTable, FieldBinding, ParseOptions};
use crate::error::{CsvError, Result};

/// Decodes lines against a binding table, reusing one scratch buffer.
///
/// Each worker thread owns one decoder; the table is shared.
#[derive(Debug, Clone, Default)]
pub struct RowDecoder {
    scratch: String,
    opts: ParseOptions,
}

impl RowDecoder {
    pub fn new(opts: ParseOptions) -> Self {
        Self {
            scratch: String::new(),
            opts,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.opts
    }

    /// Decode `line` into `record`. `line_no` is the 1-based line number used
    /// in errors.
    pub fn decode<T>(
        &mut self,
        record: &mut T,
        line: &str,
        line_no: usize,
        table: &BindingTable<T>,
    ) -> Result<()> {
        let sep = table.separator();
        let quoting = table.quote_handling();
        let columns = table.len();

        let mut start = 0usize;
        let mut column = 0usize;
        while start < line.len() && column < columns {
            let rest = &line[start..];

            let (field, consumed) = if quoting && rest.starts_with('"') {
                let consumed = unquote(rest, sep, &mut self.scratch)
                    .ok_or_else(|| CsvError::malformed_quoting(line_no, line))?;
                (self.scratch.as_str(), consumed)
            } else {
                match find_separator(rest, sep) {
                    Some(end) => (&rest[..end], end + sep.len_utf8()),
                    None => (rest, rest.len()),
                }
            };

            if let Some(binding) = table.get(column) {
                assign(binding, record, field, line, line_no, &self.opts)?;
            }

            start += consumed;
            column += 1;
        }
        Ok(())
    }
}

fn assign<T>(
    binding: &FieldBinding<T>,
    record: &mut T,
    field: &str,
    line: &str,
    line_no: usize,
    opts: &ParseOptions,
) -> Result<()> {
    if binding.is_nullable() && !binding.has_custom_serializer() {
        // Nullable members swallow bad input.
        if field.is_empty() || binding.parse(record, field, line_no, opts).is_err() {
            binding.unset(record);
        }
        return Ok(());
    }

    binding.parse(record, field, line_no, opts).map_err(|e| {
        CsvError::field_conversion(binding.member(), binding.type_name(), line_no, line, e)
    })
}

/// Unescape a quoted field at the start of `rest` into `out`.
///
/// Returns the number of bytes consumed, including the closing quote and the
/// character after it, or `None` if a quote is followed by anything other
/// than a quote, the separator or a line terminator.
fn unquote(rest: &str, sep: char, out: &mut String) -> Option<usize> {
    out.clear();
    let mut item = &rest[1..];
    let mut consumed = 1usize;

    loop {
        let Some(pos) = memchr(b'"', item.as_bytes()) else {
            out.push_str(item);
            return Some(consumed + item.len());
        };

        match item[pos + 1..].chars().next() {
            Some('"') => {
                out.push_str(&item[..=pos]);
                consumed += pos + 2;
                item = &item[pos + 2..];
            }
            Some(c) if c == sep || c == '\r' || c == '\n' => {
                out.push_str(&item[..pos]);
                return Some(consumed + pos + 1 + c.len_utf8());
            }
            None => {
                out.push_str(&item[..pos]);
                return Some(consumed + pos + 1);
            }
            Some(_) => return None,
        }
    }
}

#[inline]
fn find_separator(haystack: &str, sep: char) -> Option<usize> {
    if sep.is_ascii() {
        memchr(sep as u8, haystack.as_bytes())
    } else {
        haystack.find(sep)
    }
}
