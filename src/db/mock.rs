//! Mock connection for testing.
//!
//! Serves scripted responses keyed by statement text and keeps track of
//! what was asked and which cursors are still open.

use super::{Connection, Cursor, Row, Statement};
use crate::error::{Result, ShellError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A scripted response for one statement.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Statement succeeds without returning a relation.
    Ack,

    /// Statement returns a relation.
    Rows {
        columns: Vec<String>,
        rows: Vec<Row>,
        /// Fail with a query error after yielding this many rows.
        fail_after: Option<usize>,
    },

    /// Statement fails at submission time.
    Error(String),
}

/// A mock connection that returns predefined responses.
#[derive(Debug, Default)]
pub struct MockConnection {
    responses: HashMap<String, MockResponse>,
    received: Vec<Statement>,
    open_cursors: Arc<AtomicUsize>,
}

impl MockConnection {
    /// Creates a mock connection with no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a statement that returns no relation.
    pub fn with_ack(mut self, sql: &str) -> Self {
        self.responses.insert(sql.to_string(), MockResponse::Ack);
        self
    }

    /// Scripts a statement that returns the given columns and rows.
    pub fn with_rows(mut self, sql: &str, columns: &[&str], rows: Vec<Row>) -> Self {
        self.responses.insert(
            sql.to_string(),
            MockResponse::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                fail_after: None,
            },
        );
        self
    }

    /// Scripts a statement whose row stream fails after `fail_after` rows.
    pub fn with_failing_rows(
        mut self,
        sql: &str,
        columns: &[&str],
        rows: Vec<Row>,
        fail_after: usize,
    ) -> Self {
        self.responses.insert(
            sql.to_string(),
            MockResponse::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                fail_after: Some(fail_after),
            },
        );
        self
    }

    /// Scripts a statement that fails with the given message.
    pub fn with_error(mut self, sql: &str, message: &str) -> Self {
        self.responses
            .insert(sql.to_string(), MockResponse::Error(message.to_string()));
        self
    }

    /// Statements received so far, in submission order.
    pub fn received(&self) -> &[Statement] {
        &self.received
    }

    /// Number of cursors handed out and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn query<'a>(&'a mut self, statement: &'a Statement) -> Result<Box<dyn Cursor + 'a>> {
        self.received.push(statement.clone());

        let response = self
            .responses
            .get(statement.sql())
            .cloned()
            .ok_or_else(|| {
                ShellError::query(format!("no scripted response for: {}", statement.sql()))
            })?;

        let (columns, rows, fail_after) = match response {
            MockResponse::Ack => (None, Vec::new(), None),
            MockResponse::Rows {
                columns,
                rows,
                fail_after,
            } => (Some(columns), rows, fail_after),
            MockResponse::Error(message) => return Err(ShellError::query(message)),
        };

        Ok(Box::new(MockCursor::open(
            columns,
            rows,
            fail_after,
            Arc::clone(&self.open_cursors),
        )))
    }
}

/// Cursor over scripted rows; decrements the open-cursor count on drop.
struct MockCursor {
    columns: Option<Vec<String>>,
    rows: VecDeque<Row>,
    remaining_before_failure: Option<usize>,
    open_cursors: Arc<AtomicUsize>,
}

impl MockCursor {
    fn open(
        columns: Option<Vec<String>>,
        rows: Vec<Row>,
        fail_after: Option<usize>,
        open_cursors: Arc<AtomicUsize>,
    ) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        Self {
            columns,
            rows: rows.into(),
            remaining_before_failure: fail_after,
            open_cursors,
        }
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Cursor for MockCursor {
    fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(remaining) = self.remaining_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(ShellError::query("connection reset while reading rows"));
            }
            *remaining -= 1;
        }
        Ok(self.rows.pop_front())
    }
}
