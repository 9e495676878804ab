//! Building sizing and connection selection.

use serde::{Deserialize, Serialize};

use crate::graph::types::{EntityType, Snapshot, SnapshotNode};

/// Tickers never tower: news-cycle entities stay at street scale.
const TICKER_HEIGHT_CAP: f64 = 25.0;
/// Height boost for buildings sourced from the top-weighted document.
const TOP_SOURCE_MULTIPLIER: f64 = 1.4;

/// One rendered building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub label: String,
    pub district: String,
    pub x: f64,
    pub z: f64,
    pub height: f64,
    pub width: f64,
    pub depth: f64,
    /// Normalized importance, rounded to two decimals.
    pub importance: f64,
    pub frequency: u32,
    pub recency_score: f64,
    pub source_score: f64,
    pub sources: Vec<String>,
}

/// A pruned co-occurrence connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
    /// Strength normalized against the strongest edge in the snapshot.
    pub strength: f64,
    pub count: u32,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Both endpoints in the same district.
    Local,
    /// Cross-district span.
    Bridge,
}

/// Piecewise height bands over normalized importance, with the top-source
/// boost applied before the ticker cap.
pub fn building_height(importance: f64, entity_type: EntityType, has_top_source: bool) -> f64 {
    let base = if importance > 0.8 {
        40.0 + 30.0 * importance
    } else if importance > 0.5 {
        25.0 + 30.0 * importance
    } else if importance > 0.2 {
        12.0 + 26.0 * importance
    } else {
        5.0 + 20.0 * importance
    };
    let boosted = if has_top_source {
        base * TOP_SOURCE_MULTIPLIER
    } else {
        base
    };
    if entity_type == EntityType::Ticker {
        boosted.min(TICKER_HEIGHT_CAP)
    } else {
        boosted
    }
}

/// Footprint scales gently with importance; buildings are square.
pub fn building_footprint(importance: f64) -> f64 {
    6.0 + 8.0 * importance
}

/// Round importance for publication.
pub fn round_importance(importance: f64) -> f64 {
    (importance * 100.0).round() / 100.0
}

/// Select the connections worth rendering: count ≥ 2 or normalized strength
/// above 0.3, top `max_connections` by strength, classified local or bridge
/// by the endpoints' districts.
pub fn select_connections(
    snapshot: &Snapshot,
    district_of: impl Fn(&str) -> Option<String>,
    max_connections: usize,
) -> Vec<Connection> {
    let max_weight = snapshot
        .edges
        .iter()
        .map(|e| e.display_weight)
        .fold(0.0_f64, f64::max);
    let mut connections: Vec<Connection> = snapshot
        .edges
        .iter()
        .filter_map(|edge| {
            let strength = if max_weight > 0.0 {
                edge.display_weight / max_weight
            } else {
                0.0
            };
            if edge.co_occurrence_count < 2 && strength <= 0.3 {
                return None;
            }
            let from_district = district_of(&edge.source_id)?;
            let to_district = district_of(&edge.target_id)?;
            Some(Connection {
                from: edge.source_id.clone(),
                to: edge.target_id.clone(),
                strength,
                count: edge.co_occurrence_count,
                kind: if from_district == to_district {
                    ConnectionKind::Local
                } else {
                    ConnectionKind::Bridge
                },
            })
        })
        .collect();
    connections.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.from.as_str(), a.to.as_str()).cmp(&(b.from.as_str(), b.to.as_str())))
    });
    connections.truncate(max_connections);
    connections
}

/// Raw (pre-normalization) importance of a snapshot node:
/// `mentions × (0.5 + freshness) × source_bonus`, scaled by the district's
/// importance multiplier.
pub fn raw_importance(node: &SnapshotNode, district_multiplier: f64) -> f64 {
    node.mention_count as f64 * (0.5 + node.decay_factor) * node.source_bonus * district_multiplier
}
