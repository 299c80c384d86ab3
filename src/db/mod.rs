//! Database abstraction layer for sql-shell.
//!
//! Provides a trait-based interface over an open connection, so the executor
//! can run against PostgreSQL-wire servers or an in-memory mock.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnection, MockResponse};
pub use postgres::PostgresConnection;
pub use types::{Statement, Value};

use crate::error::Result;
use async_trait::async_trait;

/// A row of cells as returned by a connection.
pub type Row = Vec<Value>;

/// An open connection that executes parameterized statements.
#[async_trait]
pub trait Connection: Send {
    /// Submits the statement with its positional parameters and returns a cursor
    /// over the response.
    ///
    /// The cursor borrows the connection; its resources are released when it is dropped.
    async fn query<'a>(&'a mut self, statement: &'a Statement) -> Result<Box<dyn Cursor + 'a>>;
}

/// Server-side response to one statement.
#[async_trait]
pub trait Cursor: Send {
    /// Column names, or `None` when the statement returns no relation.
    fn columns(&self) -> Option<&[String]>;

    /// Fetches the next row in server order, or `None` once drained.
    async fn next_row(&mut self) -> Result<Option<Row>>;
}
