//! Core graph type definitions.
//!
//! Defines [`EntityType`] (the typed-entity categories produced by extraction),
//! [`Node`] and [`Edge`] (the live graph records owned by the store), and the
//! [`Snapshot`] family (the immutable, decayed view published to consumers).

use serde::{Deserialize, Serialize};

/// Maximum length of a normalized label, in bytes.
const MAX_NORMALIZED_LEN: usize = 100;

/// The typed-entity categories recognized by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Markdown heading text (`#` through `###`).
    Header,
    /// Bold-emphasis concept (`**…**`).
    Concept,
    /// General subject tag; produced by configuration, not extraction.
    Topic,
    /// Stock / crypto ticker symbol (whitelist or `$`-prefixed).
    Ticker,
    /// Tool or technology, from the closed lexicon or inline backticks.
    Tool,
    /// Named project matched by a configured pattern.
    Project,
    /// Bare URL.
    Url,
    /// Proper-noun person span.
    Person,
    /// Proper-noun organization span.
    Organization,
    /// Completed task item or decision-marker phrase.
    Decision,
}

impl EntityType {
    /// Wire-format string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Concept => "concept",
            Self::Topic => "topic",
            Self::Ticker => "ticker",
            Self::Tool => "tool",
            Self::Project => "project",
            Self::Url => "url",
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Decision => "decision",
        }
    }

    /// All variants, in declaration order.
    pub fn all() -> &'static [EntityType] {
        &[
            Self::Header,
            Self::Concept,
            Self::Topic,
            Self::Ticker,
            Self::Tool,
            Self::Project,
            Self::Url,
            Self::Person,
            Self::Organization,
            Self::Decision,
        ]
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "concept" => Ok(Self::Concept),
            "topic" => Ok(Self::Topic),
            "ticker" => Ok(Self::Ticker),
            "tool" => Ok(Self::Tool),
            "project" => Ok(Self::Project),
            "url" => Ok(Self::Url),
            "person" => Ok(Self::Person),
            "organization" => Ok(Self::Organization),
            "decision" => Ok(Self::Decision),
            _ => Err(format!("unknown entity type: {s}")),
        }
    }
}

/// Normalize a surface label into the id-safe form: lower-cased, whitespace
/// collapsed to underscores, anything outside `[a-z0-9_-]` stripped, truncated
/// to 100 bytes on a character boundary.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_was_space = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push('_');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        for lower in ch.to_lowercase() {
            if lower.is_ascii_alphanumeric() || lower == '_' || lower == '-' {
                out.push(lower);
            }
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.len() > MAX_NORMALIZED_LEN {
        let mut end = MAX_NORMALIZED_LEN;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
    }
    out
}

/// Build the stable node id `type:normalized-label`.
///
/// Returns `None` when nothing survives normalization (e.g. a label made
/// entirely of punctuation).
pub fn node_id(entity_type: EntityType, label: &str) -> Option<String> {
    let normalized = normalize_label(label);
    if normalized.is_empty() {
        return None;
    }
    Some(format!("{}:{normalized}", entity_type.as_str()))
}

/// Build the order-independent edge id `min(a,b)|max(a,b)`.
pub fn edge_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

/// A live graph node, owned exclusively by the [`GraphStore`](super::store::GraphStore).
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable id `type:normalized-label`.
    pub id: String,
    /// Surface label as first observed.
    pub label: String,
    pub entity_type: EntityType,
    /// Total number of occurrences across all sources.
    pub mention_count: u32,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    /// Relative paths of the documents that mention this node. Ordered so
    /// snapshots materialize deterministically.
    pub sources: std::collections::BTreeSet<String>,
}

/// A live co-occurrence edge. Endpoints are held in canonical order
/// (`a < b` lexicographically).
#[derive(Debug, Clone)]
pub struct Edge {
    pub a: String,
    pub b: String,
    pub co_occurrence_count: u32,
    pub last_seen_ms: i64,
}

impl Edge {
    pub fn id(&self) -> String {
        edge_id(&self.a, &self.b)
    }
}

/// A node as published: raw counts plus the derived decay fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub mention_count: u32,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub sources: Vec<String>,
    pub display_weight: f64,
    pub source_bonus: f64,
    pub decay_factor: f64,
    pub age_ms: i64,
}

/// An edge as published. `source_id < target_id` lexicographically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source_id: String,
    pub target_id: String,
    pub co_occurrence_count: u32,
    pub last_seen_ms: i64,
    pub display_weight: f64,
    pub decay_factor: f64,
}

/// An immutable, deep-copied view of the graph at one generation.
///
/// Nodes are ordered by id and edges by `(source_id, target_id)` so that
/// serialization is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u64,
    pub produced_at_ms: i64,
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl Snapshot {
    /// Look up a node by id. Snapshots are sorted, so this is a binary search.
    pub fn node(&self, id: &str) -> Option<&SnapshotNode> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
