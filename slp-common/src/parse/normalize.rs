//! Markdown artifact removal for model output

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("valid regex"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").expect("valid regex"));
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+").expect("valid regex"));

/// Strip markdown artifacts from raw model output
///
/// Removes, in order: fenced code blocks, `**bold**` and `*italic*` markers
/// (keeping the inner text), leading heading hashes, leading bullet markers,
/// leading `1.`-style numbering. The result is trimmed.
///
/// Marker patterns only consume spaces and tabs, never newlines, so blank-line
/// paragraph boundaries survive normalization.
pub fn normalize(raw: &str) -> String {
    let text = CODE_FENCE.replace_all(raw, "");
    let text = BOLD.replace_all(&text, "${1}");
    let text = ITALIC.replace_all(&text, "${1}");
    let text = HEADING.replace_all(&text, "");
    let text = BULLET.replace_all(&text, "");
    let text = NUMBERED.replace_all(&text, "");
    text.trim().to_string()
}
