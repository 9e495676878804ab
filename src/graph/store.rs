//! The in-memory knowledge graph — single-owner, rebuildable, never persisted.
//!
//! [`GraphStore::ingest_document`] is the write path: extract, upsert every
//! occurrence as a node, then upsert one edge per unordered pair within each
//! paragraph group. Co-occurrence is paragraph-scoped; two entities in
//! different paragraphs of the same document never edge through this path.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Result};

use super::decay::{self, DecayConfig};
use super::types::{edge_id, node_id, Edge, EntityType, Node, Snapshot, SnapshotEdge, SnapshotNode};
use crate::extract::{self, lexicon::Lexicon};

/// A key-node ranking entry: `mentions × √(degree + 1)`.
#[derive(Debug, Clone)]
pub struct KeyNode {
    pub id: String,
    pub label: String,
    pub entity_type: EntityType,
    pub score: f64,
}

#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    /// node id → neighbor node ids, maintained alongside `edges` for degree
    /// lookups.
    adjacency: HashMap<String, HashSet<String>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&edge_id(a, b))
    }

    /// Number of distinct co-occurrence partners of a node.
    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, HashSet::len)
    }

    /// Create or refresh a node: increment the mention count, refresh
    /// `last_seen`, add the source document. Returns the node id.
    pub fn upsert_node(
        &mut self,
        label: &str,
        entity_type: EntityType,
        document: &str,
        now_ms: i64,
    ) -> Result<String> {
        let Some(id) = node_id(entity_type, label) else {
            bail!("label normalizes to nothing: {label:?}");
        };
        let node = self.nodes.entry(id.clone()).or_insert_with(|| Node {
            id: id.clone(),
            label: label.to_string(),
            entity_type,
            mention_count: 0,
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            sources: Default::default(),
        });
        node.mention_count += 1;
        node.last_seen_ms = node.last_seen_ms.max(now_ms);
        node.sources.insert(document.to_string());
        Ok(id)
    }

    /// Create or refresh the co-occurrence edge between two existing nodes.
    /// Ordering is canonicalized; counts increment on every call.
    pub fn upsert_edge(&mut self, id_a: &str, id_b: &str, now_ms: i64) -> Result<String> {
        if id_a == id_b {
            bail!("self-edge rejected: {id_a}");
        }
        if !self.nodes.contains_key(id_a) {
            bail!("edge endpoint not in graph: {id_a}");
        }
        if !self.nodes.contains_key(id_b) {
            bail!("edge endpoint not in graph: {id_b}");
        }
        let id = edge_id(id_a, id_b);
        let (a, b) = if id_a <= id_b { (id_a, id_b) } else { (id_b, id_a) };
        let edge = self.edges.entry(id.clone()).or_insert_with(|| Edge {
            a: a.to_string(),
            b: b.to_string(),
            co_occurrence_count: 0,
            last_seen_ms: now_ms,
        });
        edge.co_occurrence_count += 1;
        edge.last_seen_ms = edge.last_seen_ms.max(now_ms);
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        Ok(id)
    }

    /// Extract a document and fold it in: every occurrence becomes a node,
    /// every unordered pair within a paragraph group becomes an edge.
    pub fn ingest_document(
        &mut self,
        rel_path: &str,
        content: &str,
        lexicon: &Lexicon,
        now_ms: i64,
    ) -> Result<()> {
        let groups = extract::extract(content, rel_path, lexicon)?;
        for group in &groups {
            let mut ids = Vec::with_capacity(group.occurrences.len());
            for occ in &group.occurrences {
                ids.push(self.upsert_node(&occ.label, occ.entity_type, rel_path, now_ms)?);
            }
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    if a != b {
                        self.upsert_edge(a, b, now_ms)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Additive merge: mention and co-occurrence counts sum, `first_seen`
    /// takes the earlier, `last_seen` the later, source sets union.
    pub fn merge(&mut self, other: GraphStore) {
        for (id, incoming) in other.nodes {
            match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.mention_count += incoming.mention_count;
                    node.first_seen_ms = node.first_seen_ms.min(incoming.first_seen_ms);
                    node.last_seen_ms = node.last_seen_ms.max(incoming.last_seen_ms);
                    node.sources.extend(incoming.sources);
                }
                None => {
                    self.nodes.insert(id, incoming);
                }
            }
        }
        for (id, incoming) in other.edges {
            match self.edges.get_mut(&id) {
                Some(edge) => {
                    edge.co_occurrence_count += incoming.co_occurrence_count;
                    edge.last_seen_ms = edge.last_seen_ms.max(incoming.last_seen_ms);
                }
                None => {
                    self.edges.insert(id, incoming);
                }
            }
        }
        for (id, neighbors) in other.adjacency {
            self.adjacency.entry(id).or_default().extend(neighbors);
        }
    }

    /// Produce the immutable decayed view: a deep copy with sources
    /// materialized as ordered sequences, nodes sorted by id, edges by
    /// canonical endpoint pair. Invariants are re-checked before the snapshot
    /// is handed out.
    pub fn snapshot(
        &self,
        generation: u64,
        config: &DecayConfig,
        now_ms: i64,
    ) -> Result<Snapshot> {
        let mut nodes: Vec<SnapshotNode> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.values() {
            if node.mention_count == 0 {
                bail!("invariant violated: zero mention count on {}", node.id);
            }
            if node.first_seen_ms > node.last_seen_ms {
                bail!("invariant violated: first_seen > last_seen on {}", node.id);
            }
            if node.sources.is_empty() {
                bail!("invariant violated: empty source set on {}", node.id);
            }
            let decay_f =
                decay::freshness(node.last_seen_ms, node.entity_type, config, now_ms);
            let bonus = config.source_bonus(node.sources.iter().map(String::as_str));
            nodes.push(SnapshotNode {
                id: node.id.clone(),
                label: node.label.clone(),
                entity_type: node.entity_type,
                mention_count: node.mention_count,
                first_seen_ms: node.first_seen_ms,
                last_seen_ms: node.last_seen_ms,
                sources: node.sources.iter().cloned().collect(),
                display_weight: node.mention_count as f64 * decay_f * bonus,
                source_bonus: bonus,
                decay_factor: decay_f,
                age_ms: (now_ms - node.last_seen_ms).max(0),
            });
        }
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<SnapshotEdge> = Vec::with_capacity(self.edges.len());
        for edge in self.edges.values() {
            if !self.nodes.contains_key(&edge.a) || !self.nodes.contains_key(&edge.b) {
                bail!("invariant violated: dangling edge {}", edge.id());
            }
            let decay_f =
                decay::decay_factor(edge.last_seen_ms, now_ms, config.default_half_life_ms());
            edges.push(SnapshotEdge {
                source_id: edge.a.clone(),
                target_id: edge.b.clone(),
                co_occurrence_count: edge.co_occurrence_count,
                last_seen_ms: edge.last_seen_ms,
                display_weight: edge.co_occurrence_count as f64 * decay_f,
                decay_factor: decay_f,
            });
        }
        edges.sort_by(|a, b| {
            (a.source_id.as_str(), a.target_id.as_str())
                .cmp(&(b.source_id.as_str(), b.target_id.as_str()))
        });

        Ok(Snapshot {
            generation,
            produced_at_ms: now_ms,
            nodes,
            edges,
        })
    }

    /// Rank all nodes by `mentions × √(degree + 1)`, descending, ties broken
    /// by id for determinism.
    pub fn key_nodes(&self, limit: usize) -> Vec<KeyNode> {
        let mut ranked: Vec<KeyNode> = self
            .nodes
            .values()
            .map(|node| KeyNode {
                id: node.id.clone(),
                label: node.label.clone(),
                entity_type: node.entity_type,
                score: node.mention_count as f64
                    * ((self.degree(&node.id) + 1) as f64).sqrt(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Node counts per entity type, for the stats surface.
    pub fn counts_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.entity_type.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Build a fresh store from a full document set. The rebuild path: every
/// change swaps in the result of this over the current contents.
pub fn build_from_documents<'a, I>(documents: I, lexicon: &Lexicon, now_ms: i64) -> GraphStore
where
    I: IntoIterator<Item = (&'a str, &'a str, i64)>,
{
    let mut store = GraphStore::new();
    for (rel_path, content, seen_ms) in documents {
        let at = if seen_ms > 0 { seen_ms } else { now_ms };
        if let Err(error) = store.ingest_document(rel_path, content, lexicon, at) {
            // Empty files carry no entities; anything else is worth a log line.
            tracing::debug!(path = rel_path, %error, "document skipped during build");
        }
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn lexicon() -> Lexicon {
        Lexicon::default()
    }

    #[test]
    fn upsert_node_creates_then_increments() {
        let mut store = GraphStore::new();
        let id = store
            .upsert_node("Anton", EntityType::Person, "memory/a.md", NOW)
            .unwrap();
        assert_eq!(id, "person:anton");
        store
            .upsert_node("anton", EntityType::Person, "memory/b.md", NOW + 5)
            .unwrap();

        let node = store.node("person:anton").unwrap();
        assert_eq!(node.mention_count, 2);
        assert_eq!(node.first_seen_ms, NOW);
        assert_eq!(node.last_seen_ms, NOW + 5);
        assert_eq!(node.sources.len(), 2);
        // Display label keeps the first-observed surface form.
        assert_eq!(node.label, "Anton");
    }

    #[test]
    fn upsert_node_rejects_unnormalizable_labels() {
        let mut store = GraphStore::new();
        assert!(store
            .upsert_node("???", EntityType::Concept, "a.md", NOW)
            .is_err());
    }

    #[test]
    fn upsert_edge_canonicalizes_and_counts() {
        let mut store = GraphStore::new();
        let a = store
            .upsert_node("zeta", EntityType::Concept, "a.md", NOW)
            .unwrap();
        let b = store
            .upsert_node("alpha", EntityType::Concept, "a.md", NOW)
            .unwrap();

        let id_fwd = store.upsert_edge(&a, &b, NOW).unwrap();
        let id_rev = store.upsert_edge(&b, &a, NOW + 1).unwrap();
        assert_eq!(id_fwd, id_rev);

        let edge = store.edge(&a, &b).unwrap();
        assert_eq!(edge.co_occurrence_count, 2);
        assert_eq!(edge.last_seen_ms, NOW + 1);
        assert!(edge.a < edge.b);
        assert_eq!(store.degree(&a), 1);
        assert_eq!(store.degree(&b), 1);
    }

    #[test]
    fn edges_require_existing_endpoints() {
        let mut store = GraphStore::new();
        let a = store
            .upsert_node("real", EntityType::Concept, "a.md", NOW)
            .unwrap();
        assert!(store.upsert_edge(&a, "concept:ghost", NOW).is_err());
        assert!(store.upsert_edge(&a, &a, NOW).is_err());
    }

    #[test]
    fn ingest_builds_paragraph_scoped_edges() {
        let mut store = GraphStore::new();
        store
            .ingest_document(
                "memory/2026-01-15.md",
                "Anton decided to increase NVDA allocation using `yahoo-finance`.",
                &lexicon(),
                NOW,
            )
            .unwrap();

        assert_eq!(store.node_count(), 4);
        // Three entities beyond the decision plus the decision: C(4,2) = 6 edges.
        assert_eq!(store.edge_count(), 6);
        let node = store.node("ticker:nvda").unwrap();
        assert_eq!(node.mention_count, 1);
        assert_eq!(
            node.sources.iter().collect::<Vec<_>>(),
            vec!["memory/2026-01-15.md"]
        );
        let edge = store.edge("person:anton", "ticker:nvda").unwrap();
        assert_eq!(edge.co_occurrence_count, 1);
    }

    #[test]
    fn cross_paragraph_mentions_do_not_edge() {
        let mut store = GraphStore::new();
        store
            .ingest_document(
                "memory/a.md",
                "talked to Anton about the rollout\n\nwatched NVDA drift sideways",
                &lexicon(),
                NOW,
            )
            .unwrap();
        assert!(store.node("person:anton").is_some());
        assert!(store.node("ticker:nvda").is_some());
        assert!(store.edge("person:anton", "ticker:nvda").is_none());
    }

    #[test]
    fn identical_paragraphs_double_counts_single_source() {
        let mut store = GraphStore::new();
        let paragraph = "Anton keeps watching NVDA closely";
        store
            .ingest_document(
                "memory/a.md",
                &format!("{paragraph}\n\n{paragraph}"),
                &lexicon(),
                NOW,
            )
            .unwrap();
        let node = store.node("person:anton").unwrap();
        assert_eq!(node.mention_count, 2);
        assert_eq!(node.sources.len(), 1);
        let edge = store.edge("person:anton", "ticker:nvda").unwrap();
        assert_eq!(edge.co_occurrence_count, 2);
    }

    #[test]
    fn merge_is_additive() {
        let mut left = GraphStore::new();
        left.ingest_document("memory/a.md", "Anton likes NVDA today", &lexicon(), NOW)
            .unwrap();
        let mut right = GraphStore::new();
        right
            .ingest_document("SOUL.md", "Anton likes NVDA today", &lexicon(), NOW + 10)
            .unwrap();

        left.merge(right);
        let node = left.node("person:anton").unwrap();
        assert_eq!(node.mention_count, 2);
        assert_eq!(node.first_seen_ms, NOW);
        assert_eq!(node.last_seen_ms, NOW + 10);
        assert_eq!(node.sources.len(), 2);
        let edge = left.edge("person:anton", "ticker:nvda").unwrap();
        assert_eq!(edge.co_occurrence_count, 2);
    }

    #[test]
    fn build_is_order_independent() {
        let docs = [
            ("memory/a.md", "Anton met Grace Hopper at Initech Labs", NOW),
            ("memory/b.md", "NVDA and AMD moved together again", NOW),
            ("SOUL.md", "always review the Asymmetry Scanner output", NOW),
        ];
        let forward = build_from_documents(
            docs.iter().map(|(p, c, t)| (*p, *c, *t)),
            &lexicon(),
            NOW,
        );
        let reversed = build_from_documents(
            docs.iter().rev().map(|(p, c, t)| (*p, *c, *t)),
            &lexicon(),
            NOW,
        );

        let snap_a = forward.snapshot(1, &DecayConfig::default(), NOW).unwrap();
        let snap_b = reversed.snapshot(1, &DecayConfig::default(), NOW).unwrap();
        let ids_a: Vec<&str> = snap_a.nodes.iter().map(|n| n.id.as_str()).collect();
        let ids_b: Vec<&str> = snap_b.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
        let edges_a: Vec<(&str, &str)> = snap_a
            .edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
            .collect();
        let edges_b: Vec<(&str, &str)> = snap_b
            .edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
            .collect();
        assert_eq!(edges_a, edges_b);
    }

    #[test]
    fn adding_documents_never_shrinks_counts() {
        let mut store = GraphStore::new();
        store
            .ingest_document("memory/a.md", "Anton tracks NVDA daily", &lexicon(), NOW)
            .unwrap();
        let mentions_before = store.node("person:anton").unwrap().mention_count;
        let edges_before = store.edge_count();

        store
            .ingest_document("memory/b.md", "Anton pinged Grace about docker", &lexicon(), NOW)
            .unwrap();
        assert!(store.node("person:anton").unwrap().mention_count >= mentions_before);
        assert!(store.edge_count() >= edges_before);
        assert!(store.node("ticker:nvda").is_some());
    }

    #[test]
    fn snapshot_sorts_and_round_trips() {
        let mut store = GraphStore::new();
        store
            .ingest_document(
                "memory/a.md",
                "Anton shipped docker changes with Grace",
                &lexicon(),
                NOW,
            )
            .unwrap();
        let snapshot = store.snapshot(7, &DecayConfig::default(), NOW).unwrap();

        assert!(snapshot.nodes.windows(2).all(|w| w[0].id < w[1].id));
        assert!(snapshot
            .edges
            .iter()
            .all(|e| e.source_id < e.target_id));

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.generation, 7);
        assert_eq!(back.nodes.len(), snapshot.nodes.len());
        assert_eq!(back.edges.len(), snapshot.edges.len());
        for (a, b) in snapshot.nodes.iter().zip(&back.nodes) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.mention_count, b.mention_count);
            assert_eq!(a.sources, b.sources);
            assert_eq!(a.display_weight, b.display_weight);
        }
    }

    #[test]
    fn key_nodes_rank_by_mentions_and_degree() {
        let mut store = GraphStore::new();
        // hub co-occurs with two partners; loner has equal mentions, no edges.
        let mut upsert = |label: &str| {
            store
                .upsert_node(label, EntityType::Concept, "memory/a.md", NOW)
                .unwrap()
        };
        let hub = upsert("hubword");
        upsert("hubword");
        let p1 = upsert("partner-one");
        let p2 = upsert("partner-two");
        let loner = upsert("loner");
        upsert("loner");
        store.upsert_edge(&hub, &p1, NOW).unwrap();
        store.upsert_edge(&hub, &p2, NOW).unwrap();

        let ranked = store.key_nodes(10);
        assert_eq!(ranked[0].id, hub);
        let hub_entry = &ranked[0];
        let loner_entry = ranked.iter().find(|k| k.id == loner).unwrap();
        // 2 mentions × √3 beats 2 mentions × √1.
        assert!((hub_entry.score - 2.0 * 3.0_f64.sqrt()).abs() < 1e-9);
        assert!((loner_entry.score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn counts_by_type_tallies() {
        let mut store = GraphStore::new();
        store
            .ingest_document("memory/a.md", "Anton met Grace near docker", &lexicon(), NOW)
            .unwrap();
        let counts = store.counts_by_type();
        assert_eq!(counts.get("person"), Some(&2));
        assert_eq!(counts.get("tool"), Some(&1));
    }
}
