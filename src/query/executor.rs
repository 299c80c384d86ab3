//! Statement execution and outcome classification.
//!
//! Provides isolated execution that can be tested independently of the
//! command-line layer.

use std::io::Write;
use std::time::Instant;

use tracing::debug;

use crate::db::{Connection, Statement, Value};
use crate::error::Result;
use crate::output::OutputSink;
use crate::query::{Outcome, ResultSet};

/// Runs statements against a borrowed connection and materializes outcomes.
pub struct QueryExecutor<'a> {
    conn: &'a mut dyn Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(conn: &'a mut dyn Connection) -> Self {
        Self { conn }
    }

    /// Executes a statement and classifies the response.
    ///
    /// A response carrying column metadata becomes [`Outcome::Rows`], even when
    /// no rows come back; anything else is an [`Outcome::Acknowledgement`]. All
    /// rows are drained eagerly in server order. The cursor is released before
    /// this returns, on success and on error alike, and no partial result is
    /// returned when the connection fails mid-stream.
    pub async fn execute(&mut self, statement: &Statement) -> Result<Outcome> {
        debug!(
            sql = statement.sql(),
            params = statement.params().len(),
            "Executing statement"
        );
        let start = Instant::now();

        let mut cursor = self.conn.query(statement).await?;
        let columns = cursor.columns().map(<[String]>::to_vec);

        // Drain even without columns: the server only finishes the statement
        // once its response has been read to the end.
        let mut rows = Vec::new();
        while let Some(row) = cursor.next_row().await? {
            rows.push(row.iter().map(Value::to_display_string).collect::<Vec<_>>());
        }
        drop(cursor);

        let outcome = match columns {
            Some(columns) => Outcome::Rows(ResultSet::new(columns, rows)?),
            None => Outcome::Acknowledgement,
        };

        match &outcome {
            Outcome::Acknowledgement => debug!(elapsed = ?start.elapsed(), "Statement acknowledged"),
            Outcome::Rows(rs) => debug!(
                elapsed = ?start.elapsed(),
                columns = rs.columns().len(),
                rows = rs.row_count(),
                "Statement returned rows"
            ),
        }

        Ok(outcome)
    }
}

/// Executes `sql` with positional `params` and writes the rendered outcome to `sink`.
///
/// Nothing is written when execution fails.
pub async fn run_query<W: Write>(
    conn: &mut dyn Connection,
    sink: &mut OutputSink<W>,
    sql: &str,
    params: Vec<Value>,
) -> Result<()> {
    let statement = Statement::with_params(sql, params);
    let outcome = QueryExecutor::new(conn).execute(&statement).await?;
    sink.write_outcome(&outcome)
}
