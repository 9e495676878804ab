//! The graph-owner task — the store's sole mutator.
//!
//! Owns the document table and the live [`GraphStore`]. Every accepted change
//! marks the graph stale; a stale graph is rebuilt from scratch over the full
//! document set and swapped in atomically, then a snapshot goes out. The
//! rebuild discipline keeps decay and edge bookkeeping exact across
//! paragraph-level source changes — incremental mutation would have to prove
//! equivalence to this.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::{DocumentRecord, OwnerMessage};
use crate::extract::lexicon::Lexicon;
use crate::graph::decay::DecayConfig;
use crate::graph::store::{self, GraphStore};
use crate::hub::SnapshotPublisher;

pub struct GraphOwner {
    documents: HashMap<String, DocumentRecord>,
    store: GraphStore,
    generation: u64,
    stale: bool,
    lexicon: Lexicon,
    decay: DecayConfig,
    publisher: SnapshotPublisher,
}

impl GraphOwner {
    pub fn new(lexicon: Lexicon, decay: DecayConfig, publisher: SnapshotPublisher) -> Self {
        Self {
            documents: HashMap::new(),
            store: GraphStore::new(),
            generation: 0,
            stale: false,
            lexicon,
            decay,
            publisher,
        }
    }

    /// Fold one message into the document table. Returns whether the graph
    /// went stale — an upsert whose hash matches the stored one is discarded.
    pub fn apply(&mut self, message: OwnerMessage) -> bool {
        match message {
            OwnerMessage::Upsert(record) => {
                if self
                    .documents
                    .get(&record.rel_path)
                    .is_some_and(|existing| existing.hash == record.hash)
                {
                    debug!(path = %record.rel_path, "content unchanged, event discarded");
                    return self.stale;
                }
                debug!(path = %record.rel_path, "document updated");
                self.documents.insert(record.rel_path.clone(), record);
                self.stale = true;
            }
            OwnerMessage::Remove(rel_path) => {
                if self.documents.remove(&rel_path).is_some() {
                    info!(path = %rel_path, "document removed");
                    self.stale = true;
                }
            }
        }
        self.stale
    }

    /// Full rebuild and snapshot publication. Clears the stale flag.
    ///
    /// Occurrence timestamps come from each document's mtime, so rebuilding
    /// over untouched documents never refreshes their decay.
    pub fn rebuild_and_publish(&mut self, now_ms: i64) -> Result<()> {
        let rebuilt = store::build_from_documents(
            self.documents
                .values()
                .map(|d| (d.rel_path.as_str(), d.content.as_str(), d.modified_ms)),
            &self.lexicon,
            now_ms,
        );
        self.store = rebuilt;
        self.stale = false;
        self.generation += 1;
        let snapshot = self.store.snapshot(self.generation, &self.decay, now_ms)?;
        info!(
            generation = snapshot.generation,
            documents = self.documents.len(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "graph rebuilt"
        );
        self.publisher.publish(snapshot);
        Ok(())
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

/// Serve owner messages until shutdown, publishing after each stale batch and
/// once more on the way out.
pub async fn run(
    mut owner: GraphOwner,
    mut messages: mpsc::Receiver<OwnerMessage>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            received = messages.recv() => {
                let Some(message) = received else { break };
                owner.apply(message);
                // Drain whatever else is queued so one rebuild covers the batch.
                while let Ok(message) = messages.try_recv() {
                    owner.apply(message);
                }
                if owner.is_stale() {
                    owner.rebuild_and_publish(chrono::Utc::now().timestamp_millis())?;
                }
            }
        }
    }
    // Final snapshot so consumers observe the closing state.
    owner.rebuild_and_publish(chrono::Utc::now().timestamp_millis())?;
    info!("graph owner stopped");
    Ok(())
}
