//! Binding module tests.

mod macro_tests;
