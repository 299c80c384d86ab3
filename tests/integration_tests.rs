//! Integration tests for sql-shell.
//!
//! Golden-output tests run against the in-memory mock connection. Tests in
//! `live_test` need a running PostgreSQL-wire server (CockroachDB or
//! PostgreSQL); set DATABASE_URL to run them.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
