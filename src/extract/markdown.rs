//! Markdown-structural extractors: headers, bold concepts, inline code, URLs.
//!
//! Also provides [`strip_markdown`], the cleanup pass run before proper-noun
//! extraction so emphasis glyphs and link targets never masquerade as names.

use std::sync::LazyLock;

use regex::Regex;

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,3})\s+(.+)$").expect("valid regex"));
static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("valid regex"));
static BACKTICK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+?)`").expect("valid regex"));
static URL_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>\)\]]+").expect("valid regex"));

/// Heading texts (`#`–`###`), 3–40 characters, excluding list-marker lines.
pub fn headers(paragraph: &str) -> Vec<&str> {
    HEADER_LINE
        .captures_iter(paragraph)
        .filter_map(|c| {
            let text = c.get(2).expect("capture 2 exists").as_str().trim();
            let len = text.chars().count();
            if !(3..=40).contains(&len) || starts_with_list_marker(text) {
                return None;
            }
            Some(text)
        })
        .collect()
}

fn starts_with_list_marker(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some('-') | Some('*') | Some('+') => chars.next().map_or(true, |c| c == ' '),
        Some(d) if d.is_ascii_digit() => {
            let rest: String = chars.collect();
            rest.starts_with('.') || rest.starts_with(')')
        }
        _ => false,
    }
}

/// Bold-emphasis concepts, 3–40 characters after trimming.
pub fn bold_concepts(paragraph: &str) -> Vec<&str> {
    BOLD_SPAN
        .captures_iter(paragraph)
        .filter_map(|c| {
            let text = c.get(1).expect("capture 1 exists").as_str().trim();
            let len = text.chars().count();
            (3..=40).contains(&len).then_some(text)
        })
        .collect()
}

/// Single-word inline-backtick tokens, 1–50 characters, no embedded whitespace.
pub fn backtick_tokens(paragraph: &str) -> Vec<&str> {
    BACKTICK_SPAN
        .captures_iter(paragraph)
        .filter_map(|c| {
            let text = c.get(1).expect("capture 1 exists").as_str().trim();
            let len = text.chars().count();
            if !(1..=50).contains(&len) || text.chars().any(char::is_whitespace) {
                return None;
            }
            Some(text)
        })
        .collect()
}

/// Bare URLs with trailing punctuation stripped.
pub fn urls(paragraph: &str) -> Vec<&str> {
    URL_SPAN
        .find_iter(paragraph)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']))
        .filter(|u| !u.is_empty())
        .collect()
}

/// Remove Markdown structure ahead of the proper-noun pass: headings, code
/// fences and spans, link targets, list markers, emphasis, table glyphs and
/// blockquote prefixes.
pub fn strip_markdown(text: &str) -> String {
    static FENCE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```.*?(```|\z)").expect("valid regex"));
    static CODE_SPAN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`[^`\n]*`").expect("valid regex"));
    static IMAGE_OR_LINK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid regex"));
    static HEADING_PREFIX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*#{1,6}\s*").expect("valid regex"));
    static LIST_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*(?:[-*+]\s+(?:\[[ xX]\]\s+)?|\d+[.)]\s+)").expect("valid regex")
    });
    static QUOTE_PREFIX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*>\s?").expect("valid regex"));

    let text = FENCE.replace_all(text, " ");
    let text = CODE_SPAN.replace_all(&text, " ");
    let text = IMAGE_OR_LINK.replace_all(&text, "$1");
    let text = URL_SPAN.replace_all(&text, " ");
    let text = HEADING_PREFIX.replace_all(&text, "");
    let text = LIST_PREFIX.replace_all(&text, "");
    let text = QUOTE_PREFIX.replace_all(&text, "");
    text.replace(['*', '_', '|'], " ")
}
