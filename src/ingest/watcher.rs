//! The watcher task — filesystem notifications to path-level change intents.

use std::path::PathBuf;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::{watched_rel_path, ChangeIntent, REDISCOVERY_INTERVAL};

/// Watch the workspace and forward intents for watched paths until shutdown.
///
/// If the workspace directory disappears the watcher drops its registration,
/// keeps quiet, and retries discovery every five seconds; downstream tasks
/// keep serving the last published snapshot meanwhile.
pub async fn run(
    workspace: PathBuf,
    intents: mpsc::Sender<ChangeIntent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if !workspace.is_dir() {
            warn!(workspace = %workspace.display(), "workspace missing, retrying discovery");
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(REDISCOVERY_INTERVAL) => continue,
            }
        }

        // The notify callback runs on its own thread; bridge into the async
        // world through an unbounded channel.
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = match notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = raw_tx.send(event);
        }) {
            Ok(watcher) => watcher,
            Err(error) => {
                warn!(%error, "failed to create filesystem watcher, retrying");
                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = tokio::time::sleep(REDISCOVERY_INTERVAL) => continue,
                }
            }
        };
        if let Err(error) = watcher.watch(&workspace, RecursiveMode::Recursive) {
            warn!(%error, "failed to watch workspace, retrying");
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(REDISCOVERY_INTERVAL) => continue,
            }
        }
        debug!(workspace = %workspace.display(), "watching");

        let mut liveness = tokio::time::interval(REDISCOVERY_INTERVAL);
        liveness.reset();
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = liveness.tick() => {
                    if !workspace.is_dir() {
                        // Fall back to the rediscovery loop.
                        break;
                    }
                }
                received = raw_rx.recv() => {
                    match received {
                        Some(Ok(event)) => {
                            for intent in translate(&workspace, &event) {
                                if intents.send(intent).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(error)) => {
                            warn!(%error, "watch error, re-registering");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    }
}

/// Map one notify event onto intents for the watched paths it touches.
/// Renames surface as a removal of the old name and a modification of the
/// new, which the existence check resolves per path.
fn translate(workspace: &std::path::Path, event: &Event) -> Vec<ChangeIntent> {
    event
        .paths
        .iter()
        .filter(|path| watched_rel_path(workspace, path).is_some())
        .map(|path| match event.kind {
            EventKind::Remove(_) => ChangeIntent::Removed(path.clone()),
            _ if !path.exists() => ChangeIntent::Removed(path.clone()),
            _ => ChangeIntent::Modified(path.clone()),
        })
        .collect()
}
