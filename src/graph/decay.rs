//! Temporal decay and source weighting.
//!
//! Display weights are derived, never stored: `mentions × 2^(−age/H) × bonus`
//! where `H` is the entity type's half-life and the bonus is the best source
//! weight across the node's provenance. Every function takes a caller-supplied
//! `now_ms` — nothing in this module touches the clock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Edge, EntityType, Node};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Half-lives and source weights driving the decay model.
#[derive(Debug, Clone)]
pub struct DecayConfig {
    /// Half-life per entity type, in milliseconds.
    half_lives_ms: HashMap<EntityType, f64>,
    /// Fallback half-life for types without an entry.
    default_half_life_ms: f64,
    /// `(pattern, multiplier)` pairs. Matched by substring in declaration
    /// order; first match wins.
    source_weights: Vec<(String, f64)>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        let mut half_lives_ms = HashMap::new();
        for (ty, days) in [
            (EntityType::Ticker, 7.0),
            (EntityType::Url, 14.0),
            (EntityType::Topic, 30.0),
            (EntityType::Header, 30.0),
            (EntityType::Concept, 30.0),
            (EntityType::Organization, 45.0),
            (EntityType::Person, 60.0),
            (EntityType::Decision, 60.0),
            (EntityType::Tool, 90.0),
        ] {
            half_lives_ms.insert(ty, days * MS_PER_DAY);
        }
        Self {
            half_lives_ms,
            default_half_life_ms: 30.0 * MS_PER_DAY,
            source_weights: vec![
                ("SOUL.md".into(), 5.0),
                ("MEMORY.md".into(), 3.0),
                ("USER.md".into(), 3.0),
                ("AGENTS.md".into(), 2.0),
                ("TOOLS.md".into(), 2.0),
                ("memory/".into(), 1.0),
            ],
        }
    }
}

impl DecayConfig {
    /// Build from day-denominated overrides (the configuration surface speaks
    /// in days; everything internal is milliseconds).
    pub fn from_overrides(
        half_lives_days: &HashMap<String, f64>,
        source_weights: &[(String, f64)],
    ) -> Self {
        let mut config = Self::default();
        for (name, days) in half_lives_days {
            if let Ok(ty) = name.parse::<EntityType>() {
                config.half_lives_ms.insert(ty, days * MS_PER_DAY);
            } else if name == "default" {
                config.default_half_life_ms = days * MS_PER_DAY;
            }
        }
        if !source_weights.is_empty() {
            config.source_weights = source_weights.to_vec();
        }
        config
    }

    /// Half-life for an entity type, in milliseconds.
    pub fn half_life_ms(&self, entity_type: EntityType) -> f64 {
        self.half_lives_ms
            .get(&entity_type)
            .copied()
            .unwrap_or(self.default_half_life_ms)
    }

    pub fn default_half_life_ms(&self) -> f64 {
        self.default_half_life_ms
    }

    /// Multiplier for a single source path. Patterns match by substring in
    /// declaration order; first match wins; unmatched paths weigh 1.0.
    pub fn source_weight(&self, path: &str) -> f64 {
        self.source_weights
            .iter()
            .find(|(pattern, _)| path.contains(pattern.as_str()))
            .map(|(_, weight)| *weight)
            .unwrap_or(1.0)
    }

    /// Best source weight across a node's provenance. Empty input weighs 1.0.
    pub fn source_bonus<'a, I>(&self, sources: I) -> f64
    where
        I: IntoIterator<Item = &'a str>,
    {
        sources
            .into_iter()
            .map(|s| self.source_weight(s))
            .fold(1.0, f64::max)
    }

    /// The path with the highest source weight among `sources`, breaking ties
    /// toward the lexicographically smaller path. Used by the layout projector
    /// to find the top-weighted source in a snapshot.
    pub fn top_source<'a, I>(&self, sources: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        sources
            .into_iter()
            .max_by(|a, b| {
                self.source_weight(a)
                    .partial_cmp(&self.source_weight(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.cmp(a))
            })
            .map(str::to_owned)
    }
}

/// `2^(−age/H)` with age clamped to zero. Equal to 1.0 at `last_seen` and
/// exactly 0.5 one half-life later.
pub fn decay_factor(last_seen_ms: i64, now_ms: i64, half_life_ms: f64) -> f64 {
    let age_ms = (now_ms - last_seen_ms).max(0) as f64;
    (2.0_f64).powf(-age_ms / half_life_ms)
}

/// Freshness of a node of the given type: its decay factor at `now_ms`.
pub fn freshness(
    last_seen_ms: i64,
    entity_type: EntityType,
    config: &DecayConfig,
    now_ms: i64,
) -> f64 {
    decay_factor(last_seen_ms, now_ms, config.half_life_ms(entity_type))
}

/// Display weight of a live node: `mentions × decay × source_bonus`.
pub fn node_display_weight(node: &Node, config: &DecayConfig, now_ms: i64) -> f64 {
    let decay = freshness(node.last_seen_ms, node.entity_type, config, now_ms);
    let bonus = config.source_bonus(node.sources.iter().map(String::as_str));
    node.mention_count as f64 * decay * bonus
}

/// Display weight of a live edge: co-occurrence count decayed at the default
/// half-life, no source bonus.
pub fn edge_display_weight(edge: &Edge, config: &DecayConfig, now_ms: i64) -> f64 {
    let decay = decay_factor(edge.last_seen_ms, now_ms, config.default_half_life_ms);
    edge.co_occurrence_count as f64 * decay
}

/// Milliseconds until a weight currently above `threshold` decays down to it:
/// `H · log₂(weight / threshold)`. `None` when the weight is already at or
/// below the threshold.
pub fn time_until_ms(display_weight: f64, threshold: f64, half_life_ms: f64) -> Option<f64> {
    if display_weight <= threshold || threshold <= 0.0 {
        return None;
    }
    Some(half_life_ms * (display_weight / threshold).log2())
}

/// Weight bands used for ranking summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Display weight above 0.7.
    Strong,
    /// Display weight in [0.3, 0.7].
    Stable,
    /// Everything below.
    Fading,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Stable => "stable",
            Self::Fading => "fading",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a display weight into its band.
pub fn bucket(display_weight: f64) -> Bucket {
    if display_weight > 0.7 {
        Bucket::Strong
    } else if display_weight >= 0.3 {
        Bucket::Stable
    } else {
        Bucket::Fading
    }
}
