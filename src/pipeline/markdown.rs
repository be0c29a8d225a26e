//! Line classification for the narrow markdown subset the analysis uses.
//!
//! The model writes headers, `Key: value` lines, numbered and bulleted
//! lists, and prose. Each line is classified on its own: there is no block
//! state, no nesting and no rejection. Every input maps to exactly one
//! [`LineKind`], so malformed model output still renders.
//!
//! ## Rule order
//!
//! 1. blank → [`LineKind::Blank`]
//! 2. leading `#` run → [`LineKind::Header`]
//! 3. `label: value` (short, no list marker, no `**`) → [`LineKind::KeyValue`]
//! 4. `12.` prefix → [`LineKind::NumberedItem`]
//! 5. `-`, `•`, `*` prefix → [`LineKind::BulletItem`]
//! 6. anything else → [`LineKind::Paragraph`]
//!
//! The guards on rule 3 keep `- Security: enabled` a bullet rather than a
//! key-value pair.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Line breaks as the model emits them: real newlines, CRLF, or the escaped
/// two-character `\n` left behind by double-encoded JSON.
static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n|\\n").unwrap());

static RE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").unwrap());

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());

/// Lines at or above this many characters are never key-value pairs.
pub const KEY_VALUE_MAX_CHARS: usize = 100;

const BULLET_MARKERS: [char; 3] = ['-', '•', '*'];

/// The semantic kind of one line, with its display payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Blank,
    Header { text: String },
    KeyValue { label: String, value: String },
    NumberedItem { number: String, content: String },
    BulletItem { content: String },
    Paragraph { text: String },
}

/// One classified line of a text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBlock {
    pub kind: LineKind,
    pub raw_text: String,
    pub render_index: usize,
}

impl LineBlock {
    /// Classify `line`, recording its position in the field.
    pub fn new(render_index: usize, line: &str) -> Self {
        Self {
            kind: classify(line),
            raw_text: line.to_string(),
            render_index,
        }
    }
}

/// Split a text field into lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    RE_LINE_BREAK.split(text).collect()
}

/// Split and classify every line of `text`.
pub fn classify_field(text: &str) -> Vec<LineBlock> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .map(|(i, line)| LineBlock::new(i, line))
        .collect()
}

/// Classify a single line. Total: never fails.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if trimmed.starts_with('#') {
        return LineKind::Header {
            text: RE_HEADER.replace(trimmed, "").into_owned(),
        };
    }

    if is_key_value(trimmed) {
        // `is_key_value` guarantees a colon
        let (label, value) = trimmed.split_once(':').unwrap_or((trimmed, ""));
        return LineKind::KeyValue {
            label: label.to_string(),
            value: value.to_string(),
        };
    }

    if RE_NUMBERED.is_match(trimmed) {
        let (number, rest) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        return LineKind::NumberedItem {
            number: number.to_string(),
            content: rest.trim().to_string(),
        };
    }

    if trimmed.starts_with(BULLET_MARKERS) {
        return LineKind::BulletItem {
            content: strip_bullet(trimmed).to_string(),
        };
    }

    LineKind::Paragraph {
        text: trimmed.to_string(),
    }
}

/// Does a trimmed line start with a bullet marker?
pub fn is_bullet(trimmed: &str) -> bool {
    trimmed.starts_with(BULLET_MARKERS)
}

/// Remove exactly one leading bullet marker and the whitespace after it.
fn strip_bullet(trimmed: &str) -> &str {
    trimmed
        .strip_prefix(BULLET_MARKERS)
        .unwrap_or(trimmed)
        .trim_start()
}

fn is_key_value(trimmed: &str) -> bool {
    trimmed.contains(':')
        && trimmed.chars().count() < KEY_VALUE_MAX_CHARS
        && !is_bullet(trimmed)
        && !RE_NUMBERED.is_match(trimmed)
        && !trimmed.contains("**")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_whitespace_lines() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t "), LineKind::Blank);
    }

    #[test]
    fn header_strips_hash_run() {
        assert_eq!(
            classify("### Phase 1: Discovery"),
            LineKind::Header {
                text: "Phase 1: Discovery".into()
            }
        );
        assert_eq!(classify("#Tight"), LineKind::Header { text: "Tight".into() });
        assert_eq!(classify("###"), LineKind::Header { text: String::new() });
    }

    #[test]
    fn key_value_splits_at_first_colon() {
        assert_eq!(
            classify("Cloud: AWS (EC2: t3, S3)"),
            LineKind::KeyValue {
                label: "Cloud".into(),
                value: " AWS (EC2: t3, S3)".into()
            }
        );
    }

    #[test]
    fn bullet_with_colon_stays_bullet() {
        assert_eq!(
            classify("- Security: enabled"),
            LineKind::BulletItem {
                content: "Security: enabled".into()
            }
        );
        assert_eq!(
            classify("• Hosting: managed"),
            LineKind::BulletItem {
                content: "Hosting: managed".into()
            }
        );
    }

    #[test]
    fn bold_or_long_colon_lines_are_not_key_value() {
        assert!(matches!(
            classify("**Admin Dashboard**: control panel"),
            LineKind::BulletItem { .. }
        ));
        let long = format!("Note: {}", "x".repeat(120));
        assert!(matches!(classify(&long), LineKind::Paragraph { .. }));
    }

    #[test]
    fn numbered_item_keeps_numeral() {
        assert_eq!(
            classify("12. Launch. Then support."),
            LineKind::NumberedItem {
                number: "12".into(),
                content: "Launch. Then support.".into()
            }
        );
    }

    #[test]
    fn numbered_item_with_colon_is_not_key_value() {
        assert_eq!(
            classify("1. **Source Code**: repository"),
            LineKind::NumberedItem {
                number: "1".into(),
                content: "**Source Code**: repository".into()
            }
        );
        assert!(matches!(
            classify("2. Design: wireframes"),
            LineKind::NumberedItem { .. }
        ));
    }

    #[test]
    fn bullet_strips_exactly_one_marker() {
        assert_eq!(
            classify("-- nested"),
            LineKind::BulletItem {
                content: "- nested".into()
            }
        );
        assert_eq!(
            classify("*   spaced"),
            LineKind::BulletItem {
                content: "spaced".into()
            }
        );
    }

    #[test]
    fn anything_else_is_paragraph() {
        assert_eq!(
            classify("  The platform streamlines collaboration.  "),
            LineKind::Paragraph {
                text: "The platform streamlines collaboration.".into()
            }
        );
        assert!(matches!(classify("1.5x faster"), LineKind::NumberedItem { .. }));
        assert!(matches!(classify("v1 release"), LineKind::Paragraph { .. }));
    }

    #[test]
    fn classification_is_total_for_odd_input() {
        for line in ["|", ":", "#", "-", "•", "*", "1.", "**", "\u{200B}", "::::"] {
            let _ = classify(line);
        }
    }

    #[test]
    fn split_handles_real_and_escaped_newlines() {
        assert_eq!(split_lines("a\nb\r\nc\\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn classify_field_records_positions() {
        let blocks = classify_field("# Title\n\nBody");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].render_index, 2);
        assert_eq!(blocks[2].raw_text, "Body");
        assert_eq!(blocks[1].kind, LineKind::Blank);
    }
}
