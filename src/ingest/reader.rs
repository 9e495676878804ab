//! The reader task — file I/O and content hashing.
//!
//! Read failures are logged and dropped, never fatal: a path that vanished
//! between the event and the read simply misses the next rebuild.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::{watched_rel_path, DocumentRecord, OwnerMessage, ReadRequest};

/// SHA-256 hex digest of document content — the idempotence gate. A path
/// whose mtime changed but whose bytes did not must not produce a snapshot.
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read one watched document. `Ok(None)` means the path fell outside the
/// watched set (a race with renames); errors bubble for the caller to log.
pub async fn read_document(workspace: &Path, path: &Path) -> Result<Option<DocumentRecord>> {
    let Some(rel_path) = watched_rel_path(workspace, path) else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let content = String::from_utf8(bytes)
        .with_context(|| format!("invalid UTF-8 in {}", path.display()))?;
    let modified_ms = tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let hash = hash_content(content.as_bytes());
    Ok(Some(DocumentRecord {
        rel_path,
        content,
        hash,
        modified_ms,
    }))
}

/// Serve read requests until shutdown. An in-flight read always completes
/// before the task observes the signal.
pub async fn run(
    workspace: PathBuf,
    mut requests: mpsc::Receiver<ReadRequest>,
    owner: mpsc::Sender<OwnerMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            received = requests.recv() => {
                let Some(request) = received else { return };
                let message = match request {
                    ReadRequest::Remove(path) => {
                        watched_rel_path(&workspace, &path).map(OwnerMessage::Remove)
                    }
                    ReadRequest::Read(path) => match read_document(&workspace, &path).await {
                        Ok(Some(record)) => {
                            debug!(path = %record.rel_path, hash = %&record.hash[..12], "document read");
                            Some(OwnerMessage::Upsert(record))
                        }
                        Ok(None) => None,
                        Err(error) => {
                            warn!(path = %path.display(), %error, "read failed, dropping event");
                            None
                        }
                    },
                };
                if let Some(message) = message {
                    if owner.send(message).await.is_err() {
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

    #[test]
    fn hashing_is_stable_and_content_sensitive() {
        assert_eq!(hash_content(b"alpha"), hash_content(b"alpha"));
        assert_ne!(hash_content(b"alpha"), hash_content(b"beta"));
        assert_eq!(hash_content(b"").len(), 64);
    }

    #[tokio::test]
    async fn read_document_returns_record_for_watched_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SOUL.md");
        std::fs::write(&path, "be kind to future readers").unwrap();

        let record = read_document(dir.path(), &path).await.unwrap().unwrap();
        assert_eq!(record.rel_path, "SOUL.md");
        assert_eq!(record.content, "be kind to future readers");
        assert_eq!(record.hash, hash_content(b"be kind to future readers"));
        assert!(record.modified_ms > 0);
    }

    #[tokio::test]
    async fn read_document_skips_unwatched_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "not watched").unwrap();
        assert!(read_document(dir.path(), &path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_document_errors_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("USER.md");
        assert!(read_document(dir.path(), &path).await.is_err());
    }
}
