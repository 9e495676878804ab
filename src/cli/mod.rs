//! One-shot CLI commands and the serve loop.
//!
//! All output frames go to stdout as JSON; logs stay on stderr so the stream
//! can be piped straight into the hub or a file.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::MemopolisConfig;
use crate::graph::decay::{self, Bucket};
use crate::graph::store::GraphStore;
use crate::graph::types::Snapshot;
use crate::hub;
use crate::ingest;
use crate::layout;

/// Read the full watched set once and build a fresh store from it.
async fn build_store(config: &MemopolisConfig) -> Result<(GraphStore, usize)> {
    let workspace = config.resolved_workspace();
    let lexicon = config.lexicon()?;
    let paths = ingest::enumerate_workspace(&workspace)?;
    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        match ingest::reader::read_document(&workspace, path).await {
            Ok(Some(record)) => documents.push(record),
            Ok(None) => {}
            Err(error) => warn!(path = %path.display(), %error, "skipping unreadable document"),
        }
    }
    let count = documents.len();
    let now_ms = chrono::Utc::now().timestamp_millis();
    let store = crate::graph::store::build_from_documents(
        documents
            .iter()
            .map(|d| (d.rel_path.as_str(), d.content.as_str(), d.modified_ms)),
        &lexicon,
        now_ms,
    );
    Ok((store, count))
}

/// `memopolis build` — one snapshot frame on stdout.
pub async fn build(config: &MemopolisConfig) -> Result<()> {
    let (store, documents) = build_store(config).await?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let snapshot = store.snapshot(1, &config.decay(), now_ms)?;
    info!(
        documents,
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "snapshot built"
    );
    println!("{}", serde_json::to_string(&snapshot)?);
    Ok(())
}

/// `memopolis layout` — project a snapshot frame (from a file or stdin) into
/// a layout frame on stdout.
pub async fn project_layout(config: &MemopolisConfig, input: Option<&Path>) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read snapshot from stdin")?;
            buffer
        }
    };
    let snapshot: Snapshot =
        serde_json::from_str(&raw).context("failed to parse snapshot frame")?;
    let frame = layout::project(&snapshot, &config.layout()?, &config.decay());
    println!("{}", serde_json::to_string(&frame)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct BucketCounts {
    strong: usize,
    stable: usize,
    fading: usize,
}

#[derive(Debug, Serialize)]
struct KeyNodeEntry {
    id: String,
    label: String,
    #[serde(rename = "type")]
    entity_type: String,
    score: f64,
}

/// Response from `memopolis stats`.
#[derive(Debug, Serialize)]
struct StatsResponse {
    documents: usize,
    nodes: usize,
    edges: usize,
    by_type: std::collections::BTreeMap<String, usize>,
    buckets: BucketCounts,
    key_nodes: Vec<KeyNodeEntry>,
}

/// `memopolis stats` — graph statistics and the key-node ranking.
pub async fn stats(config: &MemopolisConfig, top: usize) -> Result<()> {
    let (store, documents) = build_store(config).await?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    let decay_config = config.decay();
    let snapshot = store.snapshot(1, &decay_config, now_ms)?;

    let mut buckets = BucketCounts {
        strong: 0,
        stable: 0,
        fading: 0,
    };
    for node in &snapshot.nodes {
        match decay::bucket(node.display_weight) {
            Bucket::Strong => buckets.strong += 1,
            Bucket::Stable => buckets.stable += 1,
            Bucket::Fading => buckets.fading += 1,
        }
    }

    let response = StatsResponse {
        documents,
        nodes: snapshot.nodes.len(),
        edges: snapshot.edges.len(),
        by_type: store.counts_by_type(),
        buckets,
        key_nodes: store
            .key_nodes(top)
            .into_iter()
            .map(|k| KeyNodeEntry {
                id: k.id,
                label: k.label,
                entity_type: k.entity_type.to_string(),
                score: k.score,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// `memopolis serve` — run the supervisor, stream snapshot frames (and every
/// `layout_every` generations a layout frame) to stdout until ctrl-c.
pub async fn serve(config: MemopolisConfig, layout_every: Option<u64>) -> Result<()> {
    let lexicon = config.lexicon()?;
    let decay_config = config.decay();
    let layout_config = config.layout()?;
    let (publisher, mut subscription) = hub::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Frame emitter: drains the latest-wins channel onto stdout.
    let emitter_decay = decay_config.clone();
    let emitter = tokio::spawn(async move {
        let mut emitted = 0u64;
        while subscription.changed().await.is_ok() {
            let Some(snapshot) = subscription.borrow_and_update().clone() else {
                continue;
            };
            match serde_json::to_string(&*snapshot) {
                Ok(line) => println!("{line}"),
                Err(error) => warn!(%error, "snapshot serialization failed"),
            }
            emitted += 1;
            if layout_every.is_some_and(|every| every > 0 && emitted % every == 0) {
                let frame = layout::project(&snapshot, &layout_config, &emitter_decay);
                match serde_json::to_string(&frame) {
                    Ok(line) => println!("{line}"),
                    Err(error) => warn!(%error, "layout serialization failed"),
                }
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    ingest::run(config, lexicon, decay_config, publisher, shutdown_rx).await?;
    emitter.await.context("frame emitter panicked")?;
    Ok(())
}
