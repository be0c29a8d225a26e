//! Pipe-table detection for fields the prompt asks to be tables.
//!
//! The model is told to answer `timeline`, `technologies` and `investment`
//! with GFM pipe tables, and usually does. When it does not, the caller
//! falls back to line rendering, so this parser only has to answer
//! "table or not" and never repairs anything.
//!
//! Row 1 is treated as the separator purely by position. A model that
//! forgets the `|---|` row loses its first data row instead of producing a
//! table with a garbage row; that is the accepted trade-off.

use crate::pipeline::inline::{format_inline, Span};
use crate::pipeline::markdown::split_lines;
use serde::{Deserialize, Serialize};

/// Header + separator + at least one data row.
pub const MIN_TABLE_LINES: usize = 3;

/// A parsed pipe table. Rows may be ragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableModel {
    /// Header cells with inline emphasis applied.
    pub fn header_spans(&self) -> Vec<Vec<Span>> {
        self.headers.iter().map(|h| format_inline(h)).collect()
    }

    /// Body cells with inline emphasis applied.
    pub fn row_spans(&self) -> Vec<Vec<Vec<Span>>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| format_inline(c)).collect())
            .collect()
    }

    /// Widest row, header included.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Try to read `text` as a pipe table.
///
/// Returns `None` when fewer than [`MIN_TABLE_LINES`] lines start with `|`.
/// Non-table lines around the table are ignored.
pub fn try_parse_table(text: &str) -> Option<TableModel> {
    let table_lines: Vec<&str> = split_lines(text)
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .filter(|l| l.trim().starts_with('|'))
        .collect();

    if table_lines.len() < MIN_TABLE_LINES {
        return None;
    }

    let headers = parse_row(table_lines[0]);
    let rows = table_lines[2..].iter().map(|l| parse_row(l)).collect();

    Some(TableModel { headers, rows })
}

/// Split on `|`, drop the first and last segments, trim the rest.
fn parse_row(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_pipe_lines_are_not_a_table() {
        assert_eq!(try_parse_table("| A | B |\n| --- | --- |"), None);
        assert_eq!(try_parse_table("Total Duration: 12 Weeks"), None);
        assert_eq!(try_parse_table(""), None);
    }

    #[test]
    fn minimal_table() {
        let t = try_parse_table("| Week | Activity |\n|---|---|\n| 1 | Discovery |").unwrap();
        assert_eq!(t.headers, vec!["Week", "Activity"]);
        assert_eq!(t.rows, vec![vec!["1".to_string(), "Discovery".to_string()]]);
    }

    #[test]
    fn separator_position_is_skipped_even_without_dashes() {
        let t = try_parse_table("| h1 | h2 |\n| x | y |\n| a | b |\n| c | d |").unwrap();
        assert_eq!(t.rows.len(), 2);
        assert!(t.rows.iter().all(|r| r[0] != "x"));
    }

    #[test]
    fn blank_lines_and_prose_are_ignored() {
        let text = "Estimated budget below.\n\n| Phase | Cost |\n\n| --- | --- |\n| Design | $3,000 |\n| **TOTAL** | **$15,000** |\nPrices exclude tax.";
        let t = try_parse_table(text).unwrap();
        assert_eq!(t.headers, vec!["Phase", "Cost"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.row_spans()[1][0], vec![Span::Strong("TOTAL".into())]);
    }

    #[test]
    fn ragged_rows_are_kept() {
        let t = try_parse_table("| A | B | C |\n|-|-|-|\n| 1 |\n| 1 | 2 | 3 | 4 |").unwrap();
        assert_eq!(t.rows[0].len(), 1);
        assert_eq!(t.rows[1].len(), 4);
        assert_eq!(t.column_count(), 4);
    }

    #[test]
    fn escaped_newlines_split_rows() {
        let t = try_parse_table("| A |\\n|---|\\n| 1 |").unwrap();
        assert_eq!(t.rows, vec![vec!["1".to_string()]]);
    }

    #[test]
    fn missing_trailing_pipe_drops_last_cell() {
        let t = try_parse_table("| A | B\n|---|---\n| 1 | 2").unwrap();
        assert_eq!(t.headers, vec!["A"]);
        assert_eq!(t.rows[0], vec!["1".to_string()]);
    }
}
