//! Outcome of executing one statement.

use crate::error::{Result, ShellError};

/// What a successfully executed statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The statement returned no relation (DDL, `SET`, ...).
    Acknowledgement,

    /// The statement returned a relation, possibly with zero rows.
    Rows(ResultSet),
}

/// Ordered columns plus ordered rows of display text.
///
/// Every row has exactly one cell per column; this is checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultSet {
    /// Creates a result set, rejecting rows whose length differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ShellError::format_invariant(format!(
                "row {index} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in server order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
