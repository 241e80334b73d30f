/// Define a record struct and its [`CsvRecord`](crate::CsvRecord) impl.
///
/// Every field is registered in declaration order. Field options go in
/// `#[csv(...)]` attributes:
///
/// - `name = "Column"` matches a header column with a different name
/// - `index = 3` binds a fixed 0-based column
/// - `skip` leaves the field out while still consuming its ordinal
/// - `serializer = expr` converts the field with a [`CustomSerializer`](crate::CustomSerializer)
///
/// Fields without `pub` are private and only bound when
/// `include_private` is set. The struct must implement `Default`.
///
/// ```rust
/// csvbind::csv_record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Quote {
///         #[csv(name = "Ticker")]
///         pub symbol: String,
///         pub bid: f64,
///         pub size: Option<u32>,
///         #[csv(skip)]
///         pub note: String,
///     }
/// }
///
/// let fields = csvbind::binding::FieldSet::<Quote>::of();
/// assert_eq!(fields.len(), 4);
/// ```
#[macro_export]
macro_rules! csv_record {
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] []; ) => {
        $set.field::<$ty>(
            ::std::stringify!($field),
            |record| &mut record.$field,
            |record| &record.$field,
        )
        .visibility($crate::binding::Visibility::from_tokens($vis))
        $($acc)*;
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$ser:expr]; ) => {
        $set.custom_field::<$ty, _>(
            ::std::stringify!($field),
            |record| &mut record.$field,
            |record| &record.$field,
            $ser,
        )
        .visibility($crate::binding::Visibility::from_tokens($vis))
        $($acc)*;
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$($ser:tt)*]; , $($rest:tt)*) => {
        $crate::csv_record!(@member $set; $field; $ty; $vis; [$($acc)*] [$($ser)*]; $($rest)*)
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$($ser:tt)*]; skip $($rest:tt)*) => {
        $crate::csv_record!(@member $set; $field; $ty; $vis; [$($acc)* .skip()] [$($ser)*]; $($rest)*)
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$($ser:tt)*]; name = $name:expr, $($rest:tt)*) => {
        $crate::csv_record!(@member $set; $field; $ty; $vis; [$($acc)* .name($name)] [$($ser)*]; $($rest)*)
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$($ser:tt)*]; index = $index:expr, $($rest:tt)*) => {
        $crate::csv_record!(@member $set; $field; $ty; $vis; [$($acc)* .index($index)] [$($ser)*]; $($rest)*)
    };
    (@member $set:ident; $field:ident; $ty:ty; $vis:expr; [$($acc:tt)*] [$($ser:tt)*]; serializer = $s:expr, $($rest:tt)*) => {
        $crate::csv_record!(@member $set; $field; $ty; $vis; [$($acc)*] [$s]; $($rest)*)
    };

    (
        $(#[$meta:meta])*
        $svis:vis struct $name:ident {
            $(
                $(#[csv($($opt:tt)*)])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $svis struct $name {
            $( $fvis $field : $ty ),*
        }

        impl $crate::binding::CsvRecord for $name {
            fn describe(fields: &mut $crate::binding::FieldSet<Self>) {
                $(
                    $crate::csv_record!(
                        @member fields; $field; $ty; ::std::stringify!($fvis); [] [];
                        $($($opt)* ,)*
                    );
                )*
            }
        }
    };
}
