//! Decision extraction: completed task items and decision-marker phrases.

use std::sync::LazyLock;

use regex::Regex;

/// `- [x] shipped the thing`
static COMPLETED_TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s*\[[xX]\]\s+(.+)$").expect("valid regex"));

/// Decision-marker phrases. The capture runs to the end of the clause;
/// instrument clauses are cut separately.
static DECISION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:decided(?:\s+to)?|chose(?:\s+to)?|committed\s+to|settled\s+on|going\s+to|will)\s+([^.!?\n]+)",
    )
    .expect("valid regex")
});

/// Clause markers that end a decision label: the decision is the act, not the
/// instrument it was carried out with.
const INSTRUMENT_MARKERS: &[&str] = &[" using ", " with ", " via "];

/// Extract decision labels from a paragraph, trimmed to 6–99 characters.
pub fn decisions(paragraph: &str) -> Vec<String> {
    let mut out = Vec::new();
    for capture in COMPLETED_TASK.captures_iter(paragraph) {
        push_bounded(&mut out, capture.get(1).expect("capture 1 exists").as_str());
    }
    for capture in DECISION_MARKER.captures_iter(paragraph) {
        let mut text = capture.get(1).expect("capture 1 exists").as_str();
        for marker in INSTRUMENT_MARKERS {
            if let Some(at) = text.find(marker) {
                text = &text[..at];
            }
        }
        push_bounded(&mut out, text);
    }
    out
}

fn push_bounded(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim().trim_end_matches([',', ';', ':']);
    let len = trimmed.chars().count();
    if (6..=99).contains(&len) {
        out.push(trimmed.to_string());
    }
}
