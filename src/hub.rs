//! Snapshot publication — the seam between the core and the broadcast hub.
//!
//! Publication rides a `tokio::sync::watch` channel: capacity one, latest
//! value wins. A consumer that falls behind observes a monotonically
//! increasing generation counter but may skip generations, which is exactly
//! the contract the hub wants.

use std::sync::Arc;

use tokio::sync::watch;

use crate::graph::types::Snapshot;

/// Sending half, held by the graph-owner task.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

/// Receiving half. Cheap to clone; every consumer sees the latest snapshot.
pub type SnapshotSubscription = watch::Receiver<Option<Arc<Snapshot>>>;

/// Create a connected publisher/subscription pair.
pub fn channel() -> (SnapshotPublisher, SnapshotSubscription) {
    let (tx, rx) = watch::channel(None);
    (SnapshotPublisher { tx }, rx)
}

impl SnapshotPublisher {
    /// Publish a snapshot, replacing any queued predecessor.
    pub fn publish(&self, snapshot: Snapshot) {
        tracing::debug!(
            generation = snapshot.generation,
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "snapshot published"
        );
        // Send only fails when every subscriber is gone; the supervisor may
        // still be producing final snapshots during shutdown, so ignore it.
        let _ = self.tx.send(Some(Arc::new(snapshot)));
    }

    /// Latest published generation, if any.
    pub fn latest_generation(&self) -> Option<u64> {
        self.tx.borrow().as_ref().map(|s| s.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(generation: u64) -> Snapshot {
        Snapshot {
            generation,
            produced_at_ms: generation as i64,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    #[tokio::test]
    async fn latest_snapshot_wins() {
        let (publisher, mut subscription) = channel();
        publisher.publish(snapshot(1));
        publisher.publish(snapshot(2));
        publisher.publish(snapshot(3));

        subscription.changed().await.unwrap();
        let seen = subscription.borrow_and_update().clone().unwrap();
        // Generations 1 and 2 were replaced before the consumer looked.
        assert_eq!(seen.generation, 3);
        assert_eq!(publisher.latest_generation(), Some(3));
    }

    #[tokio::test]
    async fn publish_survives_dropped_subscribers() {
        let (publisher, subscription) = channel();
        drop(subscription);
        publisher.publish(snapshot(1));
        assert_eq!(publisher.latest_generation(), Some(1));
    }
}
