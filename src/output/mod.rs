//! Rendering of statement outcomes and the destination they are written to.

mod formatter;
mod sink;

pub use formatter::{render, ResultFormatter};
pub use sink::OutputSink;
