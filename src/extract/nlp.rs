//! Proper-noun extraction over markdown-stripped text.
//!
//! A deliberately boring pass: consecutive capitalized tokens form a span,
//! leading articles and auxiliary verbs are discarded, and a suffix/name
//! lexicon splits organizations from people. Lexicon extractors outrank
//! anything found here — the caller resolves collisions.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::lexicon::Lexicon;
use crate::graph::types::EntityType;

/// Auxiliary verbs that are never names on their own.
static AUX_VERBS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "Will", "Would", "Can", "Could", "May", "Might", "Must", "Shall", "Should", "Is",
        "Are", "Was", "Were", "Be", "Been", "Being", "Has", "Have", "Had", "Do", "Does", "Did",
    ]
    .into_iter()
    .collect()
});

/// Common sentence-leading words that the capitalization heuristic would
/// otherwise promote to people.
static SENTENCE_STARTERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "The", "This", "That", "These", "Those", "There", "Here", "Then", "When", "While",
        "After", "Before", "Because", "But", "And", "Or", "So", "If", "Not", "No", "Yes", "We",
        "I", "You", "He", "She", "It", "They", "My", "Our", "Your", "His", "Her", "Its",
        "Their", "What", "Why", "How", "Who", "Also", "Another", "Some", "Any", "Each",
        "Every", "Today", "Tomorrow", "Yesterday", "Now", "Next", "Last", "First", "Finally",
        "Maybe", "Perhaps", "Note", "Update", "Decision", "Meeting", "Review", "Plan",
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        "January", "February", "March", "April", "June", "July", "August", "September",
        "October", "November", "December",
    ]
    .into_iter()
    .collect()
});

/// Lowercase connectors allowed inside a span ("Bank of America").
const SPAN_CONNECTORS: &[&str] = &["of", "&", "and", "de", "van", "von"];

/// A proper-noun span with its resolved classification.
#[derive(Debug, PartialEq)]
pub struct ProperNoun {
    pub label: String,
    pub entity_type: EntityType,
}

/// Extract proper-noun spans from markdown-stripped text.
pub fn proper_nouns(stripped: &str, lexicon: &Lexicon) -> Vec<ProperNoun> {
    let mut spans: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut pending_connectors = 0usize;

    for raw in stripped.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
        if token.is_empty() {
            flush(&mut spans, &mut current, &mut pending_connectors);
            continue;
        }
        if is_capitalized_word(token) {
            current.push(token);
            pending_connectors = 0;
        } else if !current.is_empty() && SPAN_CONNECTORS.contains(&token) && pending_connectors == 0
        {
            // Hold one connector; it only joins if a capitalized word follows.
            current.push(token);
            pending_connectors = 1;
        } else {
            flush(&mut spans, &mut current, &mut pending_connectors);
        }
        // Sentence punctuation on the raw token ends the span too.
        if raw.ends_with(['.', '!', '?', ':', ';', ',']) {
            flush(&mut spans, &mut current, &mut pending_connectors);
        }
    }
    flush(&mut spans, &mut current, &mut pending_connectors);

    spans
        .into_iter()
        .filter_map(|span| classify(span, lexicon))
        .collect()
}

fn flush<'t>(spans: &mut Vec<Vec<&'t str>>, current: &mut Vec<&'t str>, pending: &mut usize) {
    if *pending > 0 {
        // Trailing connector never made it into a name.
        current.pop();
        *pending = 0;
    }
    if !current.is_empty() {
        spans.push(std::mem::take(current));
    }
}

/// Capitalized, not an all-caps acronym (those belong to the ticker rule).
fn is_capitalized_word(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    if !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
        return false;
    }
    rest.iter().all(|c| c.is_alphabetic() || matches!(c, '\'' | '-' | '.'))
}

fn classify(mut span: Vec<&str>, lexicon: &Lexicon) -> Option<ProperNoun> {
    // Articles never start a name.
    while matches!(span.first(), Some(&"The") | Some(&"A") | Some(&"An")) {
        span.remove(0);
    }
    if span.is_empty() || span.len() > 4 {
        return None;
    }
    if span.len() == 1 {
        let word = span[0];
        if word.chars().count() < 3
            || AUX_VERBS.contains(word)
            || SENTENCE_STARTERS.contains(word)
        {
            return None;
        }
    }
    let label = span.join(" ");
    let chars = label.chars().count();
    if !(2..=60).contains(&chars) {
        return None;
    }
    let lower = label.to_lowercase();
    let entity_type = if lexicon.is_known_organization(&lower) || lexicon.has_org_suffix(&lower) {
        EntityType::Organization
    } else {
        EntityType::Person
    };
    Some(ProperNoun { label, entity_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<(String, EntityType)> {
        let lexicon = Lexicon::default();
        proper_nouns(text, &lexicon)
            .into_iter()
            .map(|p| (p.label, p.entity_type))
            .collect()
    }

    #[test]
    fn single_name_at_sentence_start() {
        let found = names("Anton decided to increase the allocation.");
        assert_eq!(found, vec![("Anton".to_string(), EntityType::Person)]);
    }

    #[test]
    fn multi_word_person_span() {
        let found = names("talked with Grace Hopper about compilers");
        assert_eq!(found, vec![("Grace Hopper".to_string(), EntityType::Person)]);
    }

    #[test]
    fn connector_joins_organization() {
        let found = names("opened an account at Bank of America yesterday");
        assert_eq!(
            found,
            vec![("Bank of America".to_string(), EntityType::Organization)]
        );
    }

    #[test]
    fn trailing_connector_is_dropped() {
        let found = names("met Ada Lovelace of the institute");
        assert_eq!(
            found,
            vec![("Ada Lovelace".to_string(), EntityType::Person)]
        );
    }

    #[test]
    fn suffix_marks_organization() {
        let found = names("signed with Initech Labs this week");
        assert_eq!(
            found,
            vec![("Initech Labs".to_string(), EntityType::Organization)]
        );
    }

    #[test]
    fn known_org_names_classify() {
        let found = names("Anthropic shipped a new model");
        assert_eq!(
            found,
            vec![("Anthropic".to_string(), EntityType::Organization)]
        );
    }

    #[test]
    fn aux_verbs_articles_and_starters_discarded() {
        assert!(names("Will ship the fix. This works. The end.").is_empty());
    }

    #[test]
    fn all_caps_acronyms_are_not_people() {
        assert!(names("NVDA rallied again").is_empty());
    }

    #[test]
    fn sentence_punctuation_splits_spans() {
        let found = names("met Alice. Bob arrived later");
        let labels: Vec<_> = found.iter().map(|p| p.0.as_str()).collect();
        assert_eq!(labels, vec!["Alice", "Bob"]);
    }
}
