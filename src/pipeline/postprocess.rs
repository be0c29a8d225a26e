//! Post-processing: deterministic cleanup of raw model output before JSON
//! parsing.
//!
//! Even with "return ONLY a JSON object" in the prompt, models regularly:
//!
//! - wrap the object in ` ```json ... ``` ` fences
//! - prepend a sentence ("Here is the proposal:") or append one
//! - emit a BOM or zero-width characters ahead of the opening brace
//!
//! Each rule is a pure `&str → String` pass, applied in a fixed order:
//! invisible characters go first so fence detection sees a clean start, and
//! object extraction goes last because it only has to cope with prose.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (BOM, zero-width spaces, soft hyphens)
/// 2. Strip outer code fences, with or without a `json`/`markdown` tag
/// 3. Cut surrounding prose down to the outermost `{ … }`
/// 4. Trim
pub fn clean_model_output(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = strip_code_fences(&s);
    let s = extract_json_object(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[ \t]*(?:json|JSON|markdown)?[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap()
});

fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 3: Extract the outermost object ─────────────────────────────────────
//
// Braces inside JSON strings cannot confuse this: the first `{` of a valid
// object is its opening brace and the last `}` is its closing one.

fn extract_json_object(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => input[start..=end].to_string(),
        _ => input.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"projectName\": \"X\"}\n```";
        assert_eq!(clean_model_output(input), "{\"projectName\": \"X\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let input = "```\n{\"a\": 1}\n```\n";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn plain_object_passes_through() {
        let input = "{\"a\": \"| x | y |\"}";
        assert_eq!(clean_model_output(input), input);
    }

    #[test]
    fn surrounding_prose_is_dropped() {
        let input = "Here is the proposal:\n{\"a\": \"{nested}\"}\nLet me know!";
        assert_eq!(clean_model_output(input), "{\"a\": \"{nested}\"}");
    }

    #[test]
    fn bom_before_fence_is_removed() {
        let input = "\u{FEFF}```json\n{}\n```";
        assert_eq!(clean_model_output(input), "{}");
    }

    #[test]
    fn no_object_is_left_for_the_parser_to_reject() {
        assert_eq!(clean_model_output("  sorry, I can't  "), "sorry, I can't");
    }
}
