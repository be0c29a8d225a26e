//! Section rendering: classified lines → a vertical flow of styled blocks.
//!
//! Two renderers share the same classification:
//!
//! * [`render_field`]: generic text fields. Bullets get a glyph marker.
//! * [`render_lettered`]: scope-of-work and deliverables. Bullets get
//!   `a)`, `b)`, … and the letter restarts after every header.
//!
//! The lettered counter is threaded through a fold, so both renderers are
//! pure functions of their input lines.

use crate::pipeline::inline::{format_inline, Span};
use crate::pipeline::markdown::{classify, split_lines, LineKind};
use crate::pipeline::table::{try_parse_table, TableModel};
use serde::{Deserialize, Serialize};

/// Glyph used for unlettered bullets.
pub const BULLET_GLYPH: &str = "●";

/// The marker drawn in front of a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Glyph,
    Letter(char),
}

impl Marker {
    /// Display form: `●` or `a)`.
    pub fn label(&self) -> String {
        match self {
            Marker::Glyph => BULLET_GLYPH.to_string(),
            Marker::Letter(c) => format!("{c})"),
        }
    }
}

/// One rendered block of a section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// Fixed-height gap preserving a blank source line.
    Spacer,
    /// Sub-heading inside a section.
    Heading(String),
    /// Bold label followed by its value, e.g. `Backend: Node.js`.
    KeyValue { label: String, value: String },
    /// Right-aligned `N.` followed by content.
    Numbered { number: String, content: Vec<Span> },
    /// Marker followed by content.
    Bullet { marker: Marker, content: Vec<Span> },
    Paragraph(Vec<Span>),
    Table {
        headers: Vec<Vec<Span>>,
        rows: Vec<Vec<Vec<Span>>>,
    },
}

impl Block {
    fn from_line(kind: LineKind) -> Self {
        match kind {
            LineKind::Blank => Block::Spacer,
            LineKind::Header { text } => Block::Heading(text),
            LineKind::KeyValue { label, value } => Block::KeyValue { label, value },
            LineKind::NumberedItem { number, content } => Block::Numbered {
                number,
                content: format_inline(&content),
            },
            LineKind::BulletItem { content } => Block::Bullet {
                marker: Marker::Glyph,
                content: format_inline(&content),
            },
            LineKind::Paragraph { text } => Block::Paragraph(format_inline(&text)),
        }
    }

    /// A table block built from a parsed [`TableModel`].
    pub fn table(model: &TableModel) -> Self {
        Block::Table {
            headers: model.header_spans(),
            rows: model.row_spans(),
        }
    }

    /// Glyph bullet with inline emphasis, for list fields bound directly.
    pub fn bullet(text: &str) -> Self {
        Block::Bullet {
            marker: Marker::Glyph,
            content: format_inline(text.trim()),
        }
    }
}

/// Render a free-text field (contract A).
pub fn render_field(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }
    split_lines(text)
        .into_iter()
        .map(|line| Block::from_line(classify(line)))
        .collect()
}

/// Render `text` as a table when it parses as one, otherwise as a field.
pub fn render_table_or_field(text: &str) -> Vec<Block> {
    match try_parse_table(text) {
        Some(model) => vec![Block::table(&model)],
        None => render_field(text),
    }
}

/// Render lines with lettered bullets (contract B).
///
/// Headers, and lines opening with the word "module", restart the letters.
pub fn render_lettered<S: AsRef<str>>(lines: &[S]) -> Vec<Block> {
    lines
        .iter()
        .scan(0u32, |counter, line| Some(lettered_step(counter, line.as_ref())))
        .collect()
}

/// One step of the lettered fold: classify `line`, update `counter`.
fn lettered_step(counter: &mut u32, line: &str) -> Block {
    let kind = classify(line);
    if matches!(kind, LineKind::Header { .. }) || starts_module(line) {
        *counter = 0;
        return Block::from_line(kind);
    }
    match kind {
        LineKind::BulletItem { content } => {
            let letter = char::from_u32(97 + *counter).unwrap_or('?');
            *counter += 1;
            Block::Bullet {
                marker: Marker::Letter(letter),
                content: format_inline(&content),
            }
        }
        other => Block::from_line(other),
    }
}

fn starts_module(line: &str) -> bool {
    line.trim()
        .get(..6)
        .is_some_and(|p| p.eq_ignore_ascii_case("module"))
}

/// Non-blank lines of `text`, as paginated scope content.
pub fn content_lines(text: &str) -> Vec<String> {
    split_lines(text)
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
