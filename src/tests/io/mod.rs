//! Byte source tests.

mod file_tests;
