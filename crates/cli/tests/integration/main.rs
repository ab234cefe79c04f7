//! CLI integration tests against the file-backed remote.

mod apply_tests;
mod common;
mod diff_tests;
