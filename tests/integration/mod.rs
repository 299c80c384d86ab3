//! Integration tests for sql-shell.

pub mod live_test;
pub mod run_query_test;
