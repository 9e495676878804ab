//! The ingestion supervisor — mirrors a workspace of Markdown memory files
//! into a live [`GraphStore`](crate::graph::store::GraphStore) and publishes
//! snapshots.
//!
//! Four tasks coordinate over typed channels, leaves first: a [`watcher`]
//! translating filesystem notifications into change intents, a [`debounce`]r
//! coalescing bursts per path, a [`reader`] doing the blocking I/O and
//! hashing, and the graph [`owner`] — the store's sole mutator — which
//! rebuilds and publishes. A single root shutdown signal stops them in LIFO
//! order; the owner publishes one final snapshot on the way out.

pub mod debounce;
pub mod owner;
pub mod reader;
pub mod watcher;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::config::MemopolisConfig;
use crate::extract::lexicon::Lexicon;
use crate::graph::decay::DecayConfig;
use crate::hub::SnapshotPublisher;

/// The fixed top-level files of the watched set.
pub const TOP_LEVEL_FILES: &[&str] = &[
    "MEMORY.md",
    "MEMORY_EXTENDED.md",
    "SOUL.md",
    "USER.md",
    "AGENTS.md",
    "TOOLS.md",
];

/// Interval for rediscovering a workspace that disappeared mid-run.
pub const REDISCOVERY_INTERVAL: Duration = Duration::from_secs(5);

/// A path-level change intent out of the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeIntent {
    Modified(PathBuf),
    Removed(PathBuf),
}

/// What the debouncer asks the reader to do once a path has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRequest {
    Read(PathBuf),
    Remove(PathBuf),
}

/// A fully read document on its way to the graph owner.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Workspace-relative path with forward slashes (`memory/2026-01-15.md`).
    pub rel_path: String,
    pub content: String,
    /// SHA-256 of the content bytes, hex.
    pub hash: String,
    /// Filesystem mtime; occurrence timestamps during rebuild use this so a
    /// rebuild never refreshes decay on untouched documents.
    pub modified_ms: i64,
}

/// Messages accepted by the graph owner.
#[derive(Debug, Clone)]
pub enum OwnerMessage {
    Upsert(DocumentRecord),
    Remove(String),
}

/// Map an absolute path to its workspace-relative form if it belongs to the
/// watched set: the fixed top-level files plus `*.md` directly in `memory/`.
pub fn watched_rel_path(workspace: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(workspace).ok()?;
    let mut components = relative.components();
    let first = components.next()?.as_os_str().to_str()?;
    match components.next() {
        None => TOP_LEVEL_FILES
            .contains(&first)
            .then(|| first.to_string()),
        Some(second) => {
            let name = second.as_os_str().to_str()?;
            (first == "memory"
                && components.next().is_none()
                && Path::new(name).extension().is_some_and(|e| e == "md"))
            .then(|| format!("memory/{name}"))
        }
    }
}

/// Enumerate the watched set that currently exists on disk, sorted by
/// relative path for deterministic startup folds.
pub fn enumerate_workspace(workspace: &Path) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(
        workspace.is_dir(),
        "workspace directory not found: {}",
        workspace.display()
    );
    let mut paths: Vec<PathBuf> = TOP_LEVEL_FILES
        .iter()
        .map(|name| workspace.join(name))
        .filter(|p| p.is_file())
        .collect();

    let memory_dir = workspace.join("memory");
    if memory_dir.is_dir() {
        let entries = std::fs::read_dir(&memory_dir)
            .with_context(|| format!("failed to list {}", memory_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

/// Run the supervisor until the shutdown signal fires.
///
/// Startup enumerates and folds the whole watched set, then publishes the
/// initial snapshot before any watch event is processed. A missing workspace
/// at startup is fatal; one that disappears later is retried every five
/// seconds while the last snapshot stays published.
pub async fn run(
    config: MemopolisConfig,
    lexicon: Lexicon,
    decay: DecayConfig,
    publisher: SnapshotPublisher,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let workspace = config.resolved_workspace();
    let debounce_window = Duration::from_millis(config.workspace.debounce_ms);

    let mut graph_owner = owner::GraphOwner::new(lexicon, decay, publisher);

    // Initial fold: read everything that exists, skip what fails.
    let paths = enumerate_workspace(&workspace)?;
    info!(
        workspace = %workspace.display(),
        documents = paths.len(),
        "supervisor starting"
    );
    for path in paths {
        match reader::read_document(&workspace, &path).await {
            Ok(Some(record)) => {
                graph_owner.apply(OwnerMessage::Upsert(record));
            }
            Ok(None) => {}
            Err(error) => warn!(path = %path.display(), %error, "skipping unreadable document"),
        }
    }
    graph_owner.rebuild_and_publish(chrono::Utc::now().timestamp_millis())?;

    // Wire the pipeline. Channel capacities are small; the debouncer absorbs
    // bursts and the owner drains its queue before each rebuild.
    let (intent_tx, intent_rx) = mpsc::channel::<ChangeIntent>(256);
    let (request_tx, request_rx) = mpsc::channel::<ReadRequest>(64);
    let (owner_tx, owner_rx) = mpsc::channel::<OwnerMessage>(64);

    let watcher_task = tokio::spawn(watcher::run(
        workspace.clone(),
        intent_tx,
        shutdown.clone(),
    ));
    let debounce_task = tokio::spawn(debounce::run(
        intent_rx,
        request_tx,
        debounce_window,
        config.workspace.rebuild_on_delete,
        shutdown.clone(),
    ));
    let reader_task = tokio::spawn(reader::run(
        workspace.clone(),
        request_rx,
        owner_tx,
        shutdown.clone(),
    ));
    let owner_task = tokio::spawn(owner::run(graph_owner, owner_rx, shutdown.clone()));

    let mut shutdown = shutdown;
    let _ = shutdown.changed().await;
    info!("supervisor shutting down");

    // LIFO teardown: sources stop feeding before sinks drain. In-flight reads
    // complete; the owner publishes a final snapshot before exiting.
    watcher_task.abort();
    let _ = watcher_task.await;
    let _ = debounce_task.await;
    let _ = reader_task.await;
    owner_task
        .await
        .context("graph owner task panicked")??;
    Ok(())
}
