//! The debouncer task — per-path coalescing of change bursts.
//!
//! Editors save in flurries (write, truncate, rename, chmod). Each modified
//! path gets a timer; a later event inside the window resets it, and only at
//! expiry does a read request go downstream. Removals skip the window — there
//! is nothing left to read.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::trace;

use super::{ChangeIntent, ReadRequest};

pub async fn run(
    mut intents: mpsc::Receiver<ChangeIntent>,
    requests: mpsc::Sender<ReadRequest>,
    window: Duration,
    rebuild_on_delete: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut deadlines: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        let next_deadline = deadlines.values().min().copied();
        tokio::select! {
            _ = shutdown.changed() => return,
            received = intents.recv() => {
                match received {
                    Some(ChangeIntent::Modified(path)) => {
                        trace!(path = %path.display(), "debounce timer reset");
                        deadlines.insert(path, Instant::now() + window);
                    }
                    Some(ChangeIntent::Removed(path)) => {
                        deadlines.remove(&path);
                        if rebuild_on_delete
                            && requests.send(ReadRequest::Remove(path)).await.is_err()
                        {
                            return;
                        }
                    }
                    None => return,
                }
            }
            _ = async {
                match next_deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    // Nothing pending; park until an intent arrives.
                    None => std::future::pending().await,
                }
            } => {
                let now = Instant::now();
                let expired: Vec<PathBuf> = deadlines
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(path, _)| path.clone())
                    .collect();
                for path in expired {
                    deadlines.remove(&path);
                    if requests.send(ReadRequest::Read(path)).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn harness() -> (
        mpsc::Sender<ChangeIntent>,
        mpsc::Receiver<ReadRequest>,
        watch::Sender<bool>,
        tokio::task::JoinHandle<()>,
    ) {
        let (intent_tx, intent_rx) = mpsc::channel(16);
        let (request_tx, request_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(intent_rx, request_tx, WINDOW, true, shutdown_rx));
        (intent_tx, request_rx, shutdown_tx, task)
    }

    #[tokio::test(start_paused = true)]
    async fn modification_waits_out_the_window() {
        let (intent_tx, mut request_rx, _shutdown, _task) = harness();
        let path = PathBuf::from("/ws/SOUL.md");
        intent_tx
            .send(ChangeIntent::Modified(path.clone()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(request_rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(request_rx.recv().await, Some(ReadRequest::Read(path)));
    }

    #[tokio::test(start_paused = true)]
    async fn later_event_resets_the_timer() {
        let (intent_tx, mut request_rx, _shutdown, _task) = harness();
        let path = PathBuf::from("/ws/USER.md");
        intent_tx
            .send(ChangeIntent::Modified(path.clone()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        intent_tx
            .send(ChangeIntent::Modified(path.clone()))
            .await
            .unwrap();

        // 600 ms after the first event, but only 300 ms after the second.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(request_rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(201)).await;
        assert_eq!(request_rx.recv().await, Some(ReadRequest::Read(path)));
    }

    #[tokio::test(start_paused = true)]
    async fn paths_debounce_independently() {
        let (intent_tx, mut request_rx, _shutdown, _task) = harness();
        let a = PathBuf::from("/ws/memory/a.md");
        let b = PathBuf::from("/ws/memory/b.md");
        intent_tx.send(ChangeIntent::Modified(a.clone())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        intent_tx.send(ChangeIntent::Modified(b.clone())).await.unwrap();

        tokio::time::sleep(Duration::from_millis(251)).await;
        assert_eq!(request_rx.recv().await, Some(ReadRequest::Read(a)));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(request_rx.recv().await, Some(ReadRequest::Read(b)));
    }

    #[tokio::test(start_paused = true)]
    async fn removal_bypasses_the_window() {
        let (intent_tx, mut request_rx, _shutdown, _task) = harness();
        let path = PathBuf::from("/ws/memory/gone.md");
        intent_tx
            .send(ChangeIntent::Modified(path.clone()))
            .await
            .unwrap();
        intent_tx
            .send(ChangeIntent::Removed(path.clone()))
            .await
            .unwrap();

        assert_eq!(request_rx.recv().await, Some(ReadRequest::Remove(path)));
        // The pending read was cancelled by the removal.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(request_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_task() {
        let (_intent_tx, _request_rx, shutdown, task) = harness();
        shutdown.send(true).unwrap();
        task.await.unwrap();
    }
}
