//! Per-type parse and format routines.
//!
//! Every member type the binder can handle implements [`CsvField`]. The
//! binder picks the implementation at compile time through generics, so the
//! routine stored in a binding is already specialised for its type.

use std::fmt::Write as _;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ConversionError;

/// The resolved category of a bound member's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    ISize,
    USize,
    F32,
    F64,
    Decimal,
    Char,
    String,
    Reusable,
    /// A fieldless enum parsed through its underlying integer
    Enum,
    /// Any type built from the field's text through `FromStr`
    FromSpan,
    /// Handled by a user-supplied serializer
    Custom,
}

/// Options that influence how field text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Use `lexical-core` for integers and floats
    pub fast_numeric: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { fast_numeric: true }
    }
}

/// A value that can be read from, and written to, a single CSV field.
pub trait CsvField: Sized + Send + 'static {
    const KIND: ValueKind;

    /// Nullable types are unset by empty fields and by parse failures.
    const NULLABLE: bool = false;

    /// Parse a value from the field's text.
    fn parse(text: &str, opts: &ParseOptions) -> Result<Self, ConversionError>;

    /// Parse into an existing value, reusing its storage where possible.
    fn parse_into(&mut self, text: &str, opts: &ParseOptions) -> Result<(), ConversionError> {
        *self = Self::parse(text, opts)?;
        Ok(())
    }

    /// Reset the value to its unset state. Only meaningful when `NULLABLE`.
    fn set_unset(&mut self) {}

    /// Append the value's textual form to `out`.
    fn format(&self, out: &mut String);
}

impl CsvField for bool {
    const KIND: ValueKind = ValueKind::Bool;

    /// `"1"` and `"true"` (any ASCII case) are true; everything else is false.
    fn parse(text: &str, _opts: &ParseOptions) -> Result<Self, ConversionError> {
        Ok(text == "1" || text.eq_ignore_ascii_case("true"))
    }

    fn format(&self, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }
}

macro_rules! impl_integer_field {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl CsvField for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn parse(text: &str, opts: &ParseOptions) -> Result<Self, ConversionError> {
                    let text = text.trim();
                    if opts.fast_numeric {
                        lexical_core::parse::<$ty>(text.as_bytes()).map_err(ConversionError::Lexical)
                    } else {
                        Ok(text.parse::<$ty>()?)
                    }
                }

                fn format(&self, out: &mut String) {
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

impl_integer_field! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    isize => ISize,
    usize => USize,
}

macro_rules! impl_float_field {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl CsvField for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn parse(text: &str, opts: &ParseOptions) -> Result<Self, ConversionError> {
                    let text = text.trim();
                    if opts.fast_numeric {
                        lexical_core::parse::<$ty>(text.as_bytes()).map_err(ConversionError::Lexical)
                    } else {
                        Ok(text.parse::<$ty>()?)
                    }
                }

                fn format(&self, out: &mut String) {
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

impl_float_field! {
    f32 => F32,
    f64 => F64,
}

impl CsvField for Decimal {
    const KIND: ValueKind = ValueKind::Decimal;

    fn parse(text: &str, _opts: &ParseOptions) -> Result<Self, ConversionError> {
        Ok(Decimal::from_str(text.trim())?)
    }

    fn format(&self, out: &mut String) {
        let _ = write!(out, "{}", self);
    }
}

impl CsvField for char {
    const KIND: ValueKind = ValueKind::Char;

    fn parse(text: &str, _opts: &ParseOptions) -> Result<Self, ConversionError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            (None, _) => Err(ConversionError::Empty),
            (Some(_), Some(_)) => Err(ConversionError::NotAChar(text.to_string())),
        }
    }

    fn format(&self, out: &mut String) {
        out.push(*self);
    }
}

impl CsvField for String {
    const KIND: ValueKind = ValueKind::String;

    fn parse(text: &str, _opts: &ParseOptions) -> Result<Self, ConversionError> {
        Ok(text.to_string())
    }

    fn parse_into(&mut self, text: &str, _opts: &ParseOptions) -> Result<(), ConversionError> {
        self.clear();
        self.push_str(text);
        Ok(())
    }

    fn format(&self, out: &mut String) {
        out.push_str(self);
    }
}

impl<V: CsvField> CsvField for Option<V> {
    const KIND: ValueKind = V::KIND;
    const NULLABLE: bool = true;

    fn parse(text: &str, opts: &ParseOptions) -> Result<Self, ConversionError> {
        V::parse(text, opts).map(Some)
    }

    fn parse_into(&mut self, text: &str, opts: &ParseOptions) -> Result<(), ConversionError> {
        match self {
            Some(value) => value.parse_into(text, opts),
            None => {
                *self = Some(V::parse(text, opts)?);
                Ok(())
            }
        }
    }

    fn set_unset(&mut self) {
        *self = None;
    }

    fn format(&self, out: &mut String) {
        if let Some(value) = self {
            value.format(out);
        }
    }
}

/// Implement [`CsvField`] for a type that parses with `FromStr` and formats
/// with `Display`.
///
/// ```rust
/// use std::net::Ipv4Addr;
///
/// #[derive(Debug, PartialEq)]
/// struct Host(Ipv4Addr);
///
/// impl std::str::FromStr for Host {
///     type Err = std::net::AddrParseError;
///     fn from_str(s: &str) -> Result<Self, Self::Err> {
///         s.parse().map(Host)
///     }
/// }
///
/// impl std::fmt::Display for Host {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         self.0.fmt(f)
///     }
/// }
///
/// csvbind::csv_from_str!(Host);
/// ```
#[macro_export]
macro_rules! csv_from_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::binding::CsvField for $ty {
                const KIND: $crate::binding::ValueKind = $crate::binding::ValueKind::FromSpan;

                fn parse(
                    text: &str,
                    _opts: &$crate::binding::ParseOptions,
                ) -> ::std::result::Result<Self, $crate::ConversionError> {
                    <$ty as ::std::str::FromStr>::from_str(text).map_err($crate::ConversionError::custom)
                }

                fn format(&self, out: &mut ::std::string::String) {
                    use ::std::fmt::Write as _;
                    let _ = ::std::write!(out, "{}", self);
                }
            }
        )+
    };
}

/// Define a fieldless enum that binds through its underlying integer.
///
/// ```rust
/// csvbind::csv_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Default)]
///     pub enum Side: u8 {
///         #[default]
///         Buy = 0,
///         Sell = 1,
///     }
/// }
///
/// use csvbind::binding::{CsvField, ParseOptions};
/// assert_eq!(Side::parse("1", &ParseOptions::default()).unwrap(), Side::Sell);
/// ```
#[macro_export]
macro_rules! csv_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $crate::binding::CsvField for $name {
            const KIND: $crate::binding::ValueKind = $crate::binding::ValueKind::Enum;

            fn parse(
                text: &str,
                opts: &$crate::binding::ParseOptions,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                let raw = <$repr as $crate::binding::CsvField>::parse(text, opts)?;
                $(
                    if raw == $name::$variant as $repr {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::ConversionError::Discriminant {
                    type_name: ::std::stringify!($name),
                    value: raw.to_string(),
                })
            }

            fn format(&self, out: &mut ::std::string::String) {
                use ::std::fmt::Write as _;
                let raw: $repr = match self {
                    $( $name::$variant => $name::$variant as $repr, )+
                };
                let _ = ::std::write!(out, "{}", raw);
            }
        }
    };
}
