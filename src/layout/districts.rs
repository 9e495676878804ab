//! Districts — the named semantic regions of the city.
//!
//! Each node is assigned exactly one district by keyword scoring against its
//! label. Districts also drive the initial polar placement, the district-pull
//! force, and the post-simulation bounds and activity reporting.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::decay::DecayConfig;
use crate::graph::types::Snapshot;

/// One named district and its layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
    pub name: String,
    /// Lower-case keywords scored by substring containment against labels.
    pub keywords: Vec<String>,
    /// Polar base position.
    pub x: f64,
    pub z: f64,
    /// CSS hex color for the renderer.
    pub color: String,
    /// Importance scale in [0.9, 1.5].
    pub importance_multiplier: f64,
}

impl District {
    /// Angle of the base position around the origin.
    pub fn polar_angle(&self) -> f64 {
        self.z.atan2(self.x)
    }

    /// The pull target: 60% of the way out to the base.
    pub fn pull_target(&self) -> (f64, f64) {
        (self.x * 0.6, self.z * 0.6)
    }
}

/// The v2 district set. Declaration order breaks scoring ties.
pub fn default_districts() -> Vec<District> {
    let district = |name: &str, keywords: &[&str], x: f64, z: f64, color: &str, mult: f64| {
        District {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            x,
            z,
            color: color.to_string(),
            importance_multiplier: mult,
        }
    };
    vec![
        district(
            "trading",
            &[
                "trade", "trading", "stock", "market", "ticker", "price", "invest",
                "portfolio", "position", "crypto", "option", "alloc",
            ],
            42.0,
            8.0,
            "#f59e0b",
            1.2,
        ),
        district(
            "infrastructure",
            &[
                "server", "deploy", "docker", "kubernetes", "infra", "database", "linux",
                "network", "cloud", "devops", "pipeline", "terraform", "nginx", "postgres",
            ],
            -35.0,
            30.0,
            "#3b82f6",
            1.0,
        ),
        district(
            "projects",
            &[
                "project", "scanner", "engine", "app", "feature", "build", "release",
                "prototype", "roadmap", "launch",
            ],
            -30.0,
            -34.0,
            "#8b5cf6",
            1.1,
        ),
        district(
            "memory",
            &["memory", "note", "journal", "idea", "thought", "daily", "review"],
            25.0,
            -40.0,
            "#10b981",
            0.9,
        ),
        district(
            "core",
            &["soul", "user", "agent", "core", "identity", "principle", "value"],
            6.0,
            4.0,
            "#ef4444",
            1.5,
        ),
    ]
}

/// Load a district table from a TOML file (`[[districts]]` entries).
pub fn load_districts(path: &Path) -> Result<Vec<District>> {
    #[derive(Deserialize)]
    struct DistrictFile {
        districts: Vec<District>,
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read district file {}", path.display()))?;
    let file: DistrictFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse district file {}", path.display()))?;
    anyhow::ensure!(!file.districts.is_empty(), "district file defines no districts");
    Ok(file.districts)
}

/// Score a label against every district and return the index of the winner.
/// Ties fall through declaration order; zero-score labels default to the
/// district named `memory` (or the first district if none is).
pub fn assign(districts: &[District], label: &str) -> usize {
    let lower = label.to_lowercase();
    let mut best: Option<(usize, usize)> = None; // (score, index)
    for (index, district) in districts.iter().enumerate() {
        let score = district
            .keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count();
        if score > 0 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, index));
        }
    }
    match best {
        Some((_, index)) => index,
        None => fallback_district(districts),
    }
}

fn fallback_district(districts: &[District]) -> usize {
    districts
        .iter()
        .position(|d| d.name == "memory")
        .unwrap_or(0)
}

/// Published per-district bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictBounds {
    pub center: Point,
    pub radius: f64,
    pub entity_count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

/// Compute bounds after simulation. `members` holds, per district index, the
/// freshness of each assigned node.
pub fn district_bounds(
    districts: &[District],
    members: &[Vec<f64>],
    total: usize,
) -> BTreeMap<String, DistrictBounds> {
    let mut bounds = BTreeMap::new();
    for (district, freshnesses) in districts.iter().zip(members) {
        let count = freshnesses.len();
        let share = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };
        let fresh = freshnesses.iter().filter(|f| **f > 0.5).count();
        let bonus = if fresh > 5 {
            15.0
        } else if fresh > 2 {
            8.0
        } else {
            0.0
        };
        let (cx, cz) = district.pull_target();
        bounds.insert(
            district.name.clone(),
            DistrictBounds {
                center: Point { x: cx, z: cz },
                radius: 25.0 + share.sqrt() * 40.0 + bonus,
                entity_count: count,
                color: district.color.clone(),
            },
        );
    }
    bounds
}

/// The active-district heuristic: score districts by keyword hits among nodes
/// sourced from the three most-recently-modified documents, weighted by
/// `0.1 × source_weight`, then normalize so the maximum is 1.0.
pub fn district_activity(
    districts: &[District],
    snapshot: &Snapshot,
    decay: &DecayConfig,
) -> (String, BTreeMap<String, f64>) {
    // Recency of a document is the newest last_seen among nodes it sourced.
    let mut doc_recency: BTreeMap<&str, i64> = BTreeMap::new();
    for node in &snapshot.nodes {
        for source in &node.sources {
            let entry = doc_recency.entry(source.as_str()).or_insert(i64::MIN);
            *entry = (*entry).max(node.last_seen_ms);
        }
    }
    let mut by_recency: Vec<(&str, i64)> = doc_recency.into_iter().collect();
    by_recency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let recent: Vec<&str> = by_recency.iter().take(3).map(|(doc, _)| *doc).collect();

    let mut scores = vec![0.0_f64; districts.len()];
    for node in &snapshot.nodes {
        let lower = node.label.to_lowercase();
        for source in &node.sources {
            if !recent.contains(&source.as_str()) {
                continue;
            }
            let weight = decay.source_weight(source);
            for (index, district) in districts.iter().enumerate() {
                let hits = district
                    .keywords
                    .iter()
                    .filter(|k| lower.contains(k.as_str()))
                    .count();
                scores[index] += 0.1 * weight * hits as f64;
            }
        }
    }

    let max = scores.iter().copied().fold(0.0_f64, f64::max);
    let mut activity = BTreeMap::new();
    let mut active_index = fallback_district(districts);
    let mut active_score = 0.0;
    for (index, district) in districts.iter().enumerate() {
        let normalized = if max > 0.0 { scores[index] / max } else { 0.0 };
        activity.insert(district.name.clone(), normalized);
        if scores[index] > active_score {
            active_score = scores[index];
            active_index = index;
        }
    }
    (districts[active_index].name.clone(), activity)
}
