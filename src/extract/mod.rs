//! Entity extraction — Markdown documents to typed occurrences, grouped by
//! paragraph for co-occurrence.
//!
//! The pipeline: segment into paragraphs ([`split_paragraphs`]), run the
//! exact-match extractors ([`markdown`], [`lexicon`], [`decision`]) and the
//! proper-noun pass ([`nlp`]) over each surviving paragraph, then deduplicate
//! within the paragraph by `(type, normalized-label)`. Lexicon hits are
//! authoritative; a proper-noun span that collides with one is dropped.

pub mod decision;
pub mod lexicon;
pub mod markdown;
pub mod nlp;

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;
use tracing::trace;

use crate::graph::types::{normalize_label, EntityType};
use self::lexicon::{Lexicon, TickerContext};

/// Paragraphs shorter than this (trimmed) carry no extractable signal.
const MIN_PARAGRAPH_LEN: usize = 11;

/// One typed occurrence of an entity within a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Surface form as written.
    pub label: String,
    pub entity_type: EntityType,
}

/// All occurrences of one paragraph, deduplicated by `(type, normalized)`.
#[derive(Debug, Clone)]
pub struct ParagraphGroup {
    /// Index of the paragraph within the document, counted before the
    /// short-paragraph filter.
    pub index: usize,
    pub occurrences: Vec<Occurrence>,
}

/// Extract all paragraph groups from a Markdown document.
///
/// Fails only on empty input; unrecognized text is simply not matched.
pub fn extract(content: &str, path: &str, lexicon: &Lexicon) -> Result<Vec<ParagraphGroup>> {
    if content.trim().is_empty() {
        bail!("empty content: {path}");
    }

    // Document-level scan: a bare run can classify as a ticker because some
    // other paragraph carries the $-prefixed form.
    let tickers = TickerContext::scan(content);

    let mut groups = Vec::new();
    for (index, paragraph) in split_paragraphs(content) {
        let occurrences = extract_paragraph(paragraph, lexicon, &tickers);
        if !occurrences.is_empty() {
            groups.push(ParagraphGroup { index, occurrences });
        }
    }
    trace!(path, groups = groups.len(), "extracted document");
    Ok(groups)
}

/// Split on blank-line runs and on Markdown heading boundaries (`#`–`###`).
/// Paragraphs under 11 characters of trimmed payload are discarded, but keep
/// their index in the numbering.
pub fn split_paragraphs(content: &str) -> Vec<(usize, &str)> {
    let mut boundaries: Vec<(usize, usize)> = Vec::new(); // byte ranges
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if let Some(s) = start.take() {
                boundaries.push((s, line_start));
            }
            continue;
        }
        if is_heading_line(trimmed) {
            if let Some(s) = start.take() {
                boundaries.push((s, line_start));
            }
            start = Some(line_start);
            continue;
        }
        if start.is_none() {
            start = Some(line_start);
        }
    }
    if let Some(s) = start {
        boundaries.push((s, content.len()));
    }

    boundaries
        .into_iter()
        .enumerate()
        .filter_map(|(index, (s, e))| {
            let text = content[s..e].trim();
            (text.chars().count() >= MIN_PARAGRAPH_LEN).then_some((index, text))
        })
        .collect()
}

fn is_heading_line(trimmed: &str) -> bool {
    let hashes = trimmed.bytes().take_while(|&b| b == b'#').count();
    (1..=3).contains(&hashes) && trimmed.as_bytes().get(hashes) == Some(&b' ')
}

/// Run every extractor over one paragraph and merge the results.
fn extract_paragraph(
    paragraph: &str,
    lexicon: &Lexicon,
    tickers: &TickerContext,
) -> Vec<Occurrence> {
    let mut raw: Vec<Occurrence> = Vec::new();

    for text in markdown::headers(paragraph) {
        raw.push(occurrence(text, EntityType::Header));
    }
    for text in markdown::bold_concepts(paragraph) {
        raw.push(occurrence(text, EntityType::Concept));
    }
    for run in ticker_runs(paragraph) {
        if lexicon.is_whitelisted_ticker(run)
            || (!lexicon.is_stoplisted(run) && tickers.has_dollar_form(run))
        {
            raw.push(occurrence(run, EntityType::Ticker));
        }
    }
    for text in lexicon.tool_matches(paragraph) {
        raw.push(occurrence(text, EntityType::Tool));
    }
    for text in lexicon.project_matches(paragraph) {
        raw.push(occurrence(text, EntityType::Project));
    }
    for text in markdown::backtick_tokens(paragraph) {
        raw.push(occurrence(text, EntityType::Tool));
    }
    for text in markdown::urls(paragraph) {
        raw.push(occurrence(text, EntityType::Url));
    }
    for label in decision::decisions(paragraph) {
        raw.push(Occurrence {
            label,
            entity_type: EntityType::Decision,
        });
    }

    // Everything above is authoritative; the fuzzy pass fills in what's left.
    let authoritative: HashSet<String> = raw
        .iter()
        .map(|o| normalize_label(&o.label))
        .collect();
    let stripped = markdown::strip_markdown(paragraph);
    for noun in nlp::proper_nouns(&stripped, lexicon) {
        if authoritative.contains(&normalize_label(&noun.label)) {
            continue;
        }
        raw.push(Occurrence {
            label: noun.label,
            entity_type: noun.entity_type,
        });
    }

    dedup(raw)
}

fn occurrence(label: &str, entity_type: EntityType) -> Occurrence {
    Occurrence {
        label: label.to_string(),
        entity_type,
    }
}

/// 2–5 letter uppercase ASCII runs, candidates for the ticker rule.
fn ticker_runs(paragraph: &str) -> Vec<&str> {
    static UPPER_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("valid regex"));
    UPPER_RUN.find_iter(paragraph).map(|m| m.as_str()).collect()
}

/// Deduplicate by `(type, normalized)`, keeping first-seen surface forms and
/// dropping occurrences whose labels normalize to nothing.
fn dedup(raw: Vec<Occurrence>) -> Vec<Occurrence> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for occ in raw {
        let normalized = normalize_label(&occ.label);
        if normalized.is_empty() {
            continue;
        }
        if seen.insert((occ.entity_type, normalized)) {
            out.push(occ);
        }
    }
    out
}
