//! Statement execution and outcome classification for sql-shell.
//!
//! This module isolates running one statement and materializing its outcome
//! from rendering and from the command-line layer.

pub mod executor;
mod outcome;

pub use executor::{run_query, QueryExecutor};
pub use outcome::{Outcome, ResultSet};
