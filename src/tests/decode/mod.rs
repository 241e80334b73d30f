//! Row decoder tests.

mod quoting_tests;
mod row_tests;
