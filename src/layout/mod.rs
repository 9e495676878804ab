//! The layout projector — snapshots to city frames.
//!
//! [`project`] is the single entry point and is pure: identical snapshot and
//! configuration produce a bit-identical frame. Districts and their scoring
//! live in [`districts`], the force schedule in [`simulation`], sizing and
//! connection pruning in [`buildings`].

pub mod buildings;
pub mod districts;
pub mod simulation;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::graph::decay::DecayConfig;
use crate::graph::types::Snapshot;
use self::buildings::{Building, Connection};
use self::districts::{District, DistrictBounds};
use self::simulation::{SimConfig, SimNode};

/// Identifies the layout semantics to renderers.
pub const ALGORITHM: &str = "brain-optimized-v2";

/// Full projector configuration.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub sim: SimConfig,
    pub max_connections: usize,
    pub districts: Vec<District>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            max_connections: 150,
            districts: districts::default_districts(),
        }
    }
}

/// The published layout result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFrame {
    pub algorithm: String,
    pub district_bounds: BTreeMap<String, DistrictBounds>,
    pub buildings: Vec<Building>,
    pub connections: Vec<Connection>,
    pub active_district: String,
    pub district_activity: BTreeMap<String, f64>,
}

/// Project a snapshot into building positions, district bounds, and a pruned
/// connection set.
pub fn project(snapshot: &Snapshot, config: &LayoutConfig, decay: &DecayConfig) -> LayoutFrame {
    let districts = &config.districts;

    // Assignment and raw importance.
    let mut assignment: Vec<usize> = Vec::with_capacity(snapshot.nodes.len());
    let mut raw: Vec<f64> = Vec::with_capacity(snapshot.nodes.len());
    for node in &snapshot.nodes {
        let district = districts::assign(districts, &node.label);
        assignment.push(district);
        raw.push(buildings::raw_importance(
            node,
            districts[district].importance_multiplier,
        ));
    }
    let max_raw = raw.iter().copied().fold(0.0_f64, f64::max);

    // Importance-biased initial placement, then the force schedule.
    let mut sim_nodes: Vec<SimNode> = snapshot
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let normalized = if max_raw > 0.0 { raw[i] / max_raw } else { 0.0 };
            simulation::initial_state(&node.id, normalized, &districts[assignment[i]], assignment[i])
        })
        .collect();

    let index_of: HashMap<&str, usize> = snapshot
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let sim_edges: Vec<(usize, usize, u32)> = snapshot
        .edges
        .iter()
        .filter_map(|e| {
            let i = *index_of.get(e.source_id.as_str())?;
            let j = *index_of.get(e.target_id.as_str())?;
            Some((i, j, e.co_occurrence_count))
        })
        .collect();
    simulation::run(&mut sim_nodes, &sim_edges, districts, &config.sim);

    // The top-weighted source boosts its buildings.
    let top_source = decay.top_source(
        snapshot
            .nodes
            .iter()
            .flat_map(|n| n.sources.iter().map(String::as_str)),
    );

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); districts.len()];
    let mut built: Vec<Building> = Vec::with_capacity(snapshot.nodes.len());
    for (i, node) in snapshot.nodes.iter().enumerate() {
        let importance = sim_nodes[i].importance;
        let has_top_source = top_source
            .as_deref()
            .map_or(false, |top| node.sources.iter().any(|s| s == top));
        let footprint = buildings::building_footprint(importance);
        members[assignment[i]].push(node.decay_factor);
        built.push(Building {
            id: node.id.clone(),
            entity_type: node.entity_type,
            label: node.label.clone(),
            district: districts[assignment[i]].name.clone(),
            x: sim_nodes[i].x,
            z: sim_nodes[i].z,
            height: buildings::building_height(importance, node.entity_type, has_top_source),
            width: footprint,
            depth: footprint,
            importance: buildings::round_importance(importance),
            frequency: node.mention_count,
            recency_score: node.decay_factor,
            source_score: node.source_bonus,
            sources: node.sources.clone(),
        });
    }

    let district_of = |id: &str| {
        index_of
            .get(id)
            .map(|&i| districts[assignment[i]].name.clone())
    };
    let connections = buildings::select_connections(snapshot, district_of, config.max_connections);

    let (active_district, district_activity) =
        districts::district_activity(districts, snapshot, decay);

    LayoutFrame {
        algorithm: ALGORITHM.to_string(),
        district_bounds: districts::district_bounds(districts, &members, snapshot.nodes.len()),
        buildings: built,
        connections,
        active_district,
        district_activity,
    }
}
