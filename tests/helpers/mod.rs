#![allow(dead_code)]

use std::path::Path;

use memopolis::extract::lexicon::Lexicon;
use memopolis::graph::decay::DecayConfig;
use memopolis::graph::store::{build_from_documents, GraphStore};
use memopolis::graph::types::Snapshot;
use tempfile::TempDir;

/// A fixed reference instant for deterministic decay math.
pub const NOW: i64 = 1_768_500_000_000;

pub const DAY_MS: i64 = 86_400_000;

/// Build a store over `(rel_path, content)` pairs, all stamped at `NOW`.
pub fn store_from(docs: &[(&str, &str)]) -> GraphStore {
    build_from_documents(
        docs.iter().map(|(p, c)| (*p, *c, NOW)),
        &Lexicon::default(),
        NOW,
    )
}

/// Snapshot a document set at `now_ms` with default decay.
pub fn snapshot_from(docs: &[(&str, &str)], now_ms: i64) -> Snapshot {
    store_from(docs)
        .snapshot(1, &DecayConfig::default(), now_ms)
        .unwrap()
}

/// A throwaway workspace directory with the standard layout.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("memory")).expect("memory dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the workspace root, e.g. `SOUL.md` or
    /// `memory/2026-01-15.md`.
    pub fn write(&self, rel_path: &str, content: &str) {
        std::fs::write(self.path().join(rel_path), content).expect("write");
    }

    pub fn remove(&self, rel_path: &str) {
        std::fs::remove_file(self.path().join(rel_path)).expect("remove");
    }
}
