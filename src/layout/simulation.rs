//! The force simulation that settles buildings into their rest positions.
//!
//! Deterministic by construction: initial placement jitter and velocities are
//! derived from an FNV-1a hash of the node id, never from an RNG, so the same
//! snapshot and configuration always converge to bit-identical output.

use super::districts::District;

/// Tunable force constants. Defaults match the production schedule.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub iterations: usize,
    /// Half-width of the bounding square; positions clamp to ±bounds.
    pub bounds: f64,
    /// Repulsion numerator `R`.
    pub repulsion: f64,
    /// Per-pair repulsion clamp `F_max`.
    pub max_repulsion_force: f64,
    /// Pairs farther apart than this exert no repulsion.
    pub repulsion_cutoff: f64,
    /// Attraction coefficient `A`.
    pub attraction: f64,
    pub district_pull: f64,
    pub core_pull: f64,
    pub damping: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            iterations: 150,
            bounds: 80.0,
            repulsion: 50.0,
            max_repulsion_force: 5.0,
            repulsion_cutoff: 25.0,
            attraction: 0.02,
            district_pull: 0.05,
            core_pull: 0.02,
            damping: 0.85,
        }
    }
}

/// Working state for one simulated node.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub x: f64,
    pub z: f64,
    pub vx: f64,
    pub vz: f64,
    /// Normalized importance in [0, 1].
    pub importance: f64,
    pub district: usize,
}

/// FNV-1a over the node id, the determinism primitive.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// A deterministic value in [0, 1) derived from a node id and a salt.
pub fn hash_unit(id: &str, salt: u64) -> f64 {
    let mut hash = fnv1a(id.as_bytes()) ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    // One xorshift round to decorrelate consecutive salts.
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Importance-biased initial placement: important nodes start near the core,
/// fading ones out toward the rim, fanned around their district's angle.
pub fn initial_state(id: &str, importance: f64, district: &District, index: usize) -> SimNode {
    let core_distance = 10.0 + (1.0 - importance.powf(0.4)) * 45.0;
    let jitter = hash_unit(id, 0) * 1.2 - 0.6;
    let angle = district.polar_angle() + jitter;
    SimNode {
        x: angle.cos() * core_distance,
        z: angle.sin() * core_distance,
        vx: hash_unit(id, 1) * 0.2 - 0.1,
        vz: hash_unit(id, 2) * 0.2 - 0.1,
        importance,
        district: index,
    }
}

/// Run the cooled force schedule in place.
///
/// `edges` holds `(node_index, node_index, co_occurrence_count)` triples.
/// O(N²) per iteration with a distance early-out; fine for the few thousand
/// nodes a human memory corpus produces.
pub fn run(nodes: &mut [SimNode], edges: &[(usize, usize, u32)], districts: &[District], config: &SimConfig) {
    if nodes.is_empty() {
        return;
    }
    let cutoff_sq = config.repulsion_cutoff * config.repulsion_cutoff;
    let iterations = config.iterations.max(1);
    let mut forces = vec![(0.0_f64, 0.0_f64); nodes.len()];

    for k in 0..iterations {
        let t = (1.0 - k as f64 / iterations as f64).sqrt();
        for f in &mut forces {
            *f = (0.0, 0.0);
        }

        // Pairwise repulsion, clamped and cut off by distance.
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let dx = nodes[i].x - nodes[j].x;
                let dz = nodes[i].z - nodes[j].z;
                let dist_sq = dx * dx + dz * dz;
                if dist_sq >= cutoff_sq {
                    continue;
                }
                let dist = dist_sq.sqrt();
                let magnitude =
                    (config.repulsion / (dist_sq + 1.0)).min(config.max_repulsion_force) * t;
                // Coincident nodes push apart along a hash-derived axis.
                let (ux, uz) = if dist > 1e-9 {
                    (dx / dist, dz / dist)
                } else {
                    let theta = hash_unit("", (i as u64) << 32 | j as u64) * std::f64::consts::TAU;
                    (theta.cos(), theta.sin())
                };
                forces[i].0 += ux * magnitude;
                forces[i].1 += uz * magnitude;
                forces[j].0 -= ux * magnitude;
                forces[j].1 -= uz * magnitude;
            }
        }

        // Attraction along co-occurrence edges, linear in distance.
        for &(i, j, count) in edges {
            let dx = nodes[j].x - nodes[i].x;
            let dz = nodes[j].z - nodes[i].z;
            let dist = (dx * dx + dz * dz).sqrt();
            if dist < 1e-9 {
                continue;
            }
            let magnitude = config.attraction * (count as f64).sqrt() * dist * t;
            let (ux, uz) = (dx / dist, dz / dist);
            forces[i].0 += ux * magnitude;
            forces[i].1 += uz * magnitude;
            forces[j].0 -= ux * magnitude;
            forces[j].1 -= uz * magnitude;
        }

        // District and core pulls, then integrate.
        for (node, force) in nodes.iter_mut().zip(&mut forces) {
            let (tx, tz) = districts[node.district].pull_target();
            force.0 += config.district_pull * t * (tx - node.x);
            force.1 += config.district_pull * t * (tz - node.z);
            force.0 += config.core_pull * node.importance * t * (-node.x);
            force.1 += config.core_pull * node.importance * t * (-node.z);

            let mass = 1.0 + 2.0 * node.importance;
            node.vx = config.damping * (node.vx + force.0 / mass);
            node.vz = config.damping * (node.vz + force.1 / mass);
            node.x = (node.x + node.vx).clamp(-config.bounds, config.bounds);
            node.z = (node.z + node.vz).clamp(-config.bounds, config.bounds);
        }
    }
}
