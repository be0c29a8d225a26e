//! Inline emphasis: `**bold**` markers → styled spans.
//!
//! Only one flat pass over bold markers. Italics, links and nested emphasis
//! are left as literal text; the analysis prompt never asks for them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Span {
    Plain(String),
    Strong(String),
}

impl Span {
    /// The display text without markers.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(s) | Span::Strong(s) => s,
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Span::Strong(_))
    }
}

/// Split `text` into plain and emphasised spans.
///
/// Segments enclosed by a `**` pair become [`Span::Strong`] with the markers
/// removed; everything in between stays [`Span::Plain`]. An unpaired `**`
/// is kept literally. Empty plain segments are dropped.
pub fn format_inline(text: &str) -> Vec<Span> {
    if !text.contains("**") {
        return vec![Span::Plain(text.to_string())];
    }

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in RE_STRONG.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::Plain(text[last..whole.start()].to_string()));
        }
        spans.push(Span::Strong(caps[1].to_string()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }
    if spans.is_empty() {
        spans.push(Span::Plain(String::new()));
    }
    spans
}

/// Concatenate span text, dropping the styling.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markers_is_single_plain_span() {
        assert_eq!(
            format_inline("Weekly demo calls"),
            vec![Span::Plain("Weekly demo calls".into())]
        );
    }

    #[test]
    fn bold_segments_lose_their_markers() {
        let spans = format_inline("**Source Code**: full ownership of **all** repos");
        assert_eq!(
            spans,
            vec![
                Span::Strong("Source Code".into()),
                Span::Plain(": full ownership of ".into()),
                Span::Strong("all".into()),
                Span::Plain(" repos".into()),
            ]
        );
    }

    #[test]
    fn unpaired_marker_is_literal() {
        assert_eq!(
            format_inline("rate ** 2"),
            vec![Span::Plain("rate ** 2".into())]
        );
    }

    #[test]
    fn plain_text_round_trips_without_markers() {
        let spans = format_inline("a **b** c");
        assert_eq!(plain_text(&spans), "a b c");
    }
}
