//! Plain-text result tables.
//!
//! Renders an [`Outcome`] as the exact text printed by the shell: `OK` for
//! acknowledgements, or an ASCII table with auto-sized columns. Headers are
//! centered within their column while data cells are left-aligned.

use crate::query::{Outcome, ResultSet};

/// Text printed for a statement that returned no relation.
const ACKNOWLEDGEMENT: &str = "OK\n";

/// Renders an outcome to its exact output text.
///
/// This is a pure function of the outcome.
pub fn render(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Acknowledgement => ACKNOWLEDGEMENT.to_string(),
        Outcome::Rows(result) => ResultFormatter::new(result).render(),
    }
}

/// Formats a result set as a bordered table.
pub struct ResultFormatter<'a> {
    result: &'a ResultSet,
}

impl<'a> ResultFormatter<'a> {
    /// Creates a formatter for the given result set.
    pub fn new(result: &'a ResultSet) -> Self {
        Self { result }
    }

    /// Width of each column: the longest of the header and every cell, in characters.
    ///
    /// Values are never truncated, so a column grows to fit its widest value.
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .result
            .columns()
            .iter()
            .map(|name| display_width(name))
            .collect();

        for row in self.result.rows() {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }

        widths
    }

    /// Renders the full table, one `\n`-terminated line per border, header and row.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let border = Self::render_border(&widths);

        let mut out = String::new();
        out.push_str(&border);
        out.push_str(&Self::render_header_row(self.result.columns(), &widths));
        out.push_str(&border);
        for row in self.result.rows() {
            out.push_str(&Self::render_data_row(row, &widths));
        }
        out.push_str(&border);
        out
    }

    /// Renders a horizontal border line such as `+----+------+`.
    fn render_border(widths: &[usize]) -> String {
        let mut line = String::from("+");
        for &width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    }

    /// Renders the header row, each name centered in its column.
    fn render_header_row(columns: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for (name, &width) in columns.iter().zip(widths) {
            // `^` puts the odd padding character on the right.
            line.push_str(&format!(" {:^width$} |", name, width = width));
        }
        line.push('\n');
        line
    }

    /// Renders a data row, each cell left-aligned and padded with trailing spaces.
    fn render_data_row(row: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for (cell, &width) in row.iter().zip(widths) {
            line.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        line.push('\n');
        line
    }
}

/// Display width of a value, counting each character as one unit.
fn display_width(s: &str) -> usize {
    s.chars().count()
}
