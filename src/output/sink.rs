//! Destination for rendered output.

use std::io::{self, Stdout, Write};

use crate::error::{Result, ShellError};
use crate::output::render;
use crate::query::Outcome;

/// Where rendered outcomes are written; standard output unless a writer is injected.
///
/// The caller owns the sink and decides its lifetime; tests hand in a `Vec<u8>`.
#[derive(Debug)]
pub struct OutputSink<W: Write = Stdout> {
    writer: W,
}

impl OutputSink<Stdout> {
    /// Creates a sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Default for OutputSink<Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> OutputSink<W> {
    /// Creates a sink writing to the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Renders the outcome in full, then writes and flushes it in one go.
    pub fn write_outcome(&mut self, outcome: &Outcome) -> Result<()> {
        let text = render(outcome);
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|e| ShellError::output(format!("Failed to write results: {e}")))
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
