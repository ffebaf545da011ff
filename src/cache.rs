//! Snapshot memoization keyed by file content.
//!
//! The dashboard re-runs filters and aggregates on every interaction but
//! should only parse the snapshot again when its bytes change. The key is
//! the SHA-256 of the file; invalidation is explicit.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::data::model::CleanedTable;
use crate::data::snapshot::read_snapshot_from;
use crate::error::{ExplorerError, Result};

struct CacheEntry {
    path: PathBuf,
    digest: String,
    table: Arc<CleanedTable>,
}

/// Holds the most recently parsed snapshot.
#[derive(Default)]
pub struct SnapshotCache {
    entry: Option<CacheEntry>,
    hits: usize,
    misses: usize,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the snapshot at `path`, parsing it only if the path or content changed.
    pub fn load(&mut self, path: &Path) -> Result<Arc<CleanedTable>> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExplorerError::SourceNotFound(path.to_path_buf()),
            _ => ExplorerError::SourceUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        let digest = content_digest(&bytes);

        if let Some(entry) = &self.entry {
            if entry.path == path && entry.digest == digest {
                self.hits += 1;
                log::debug!("Snapshot cache hit for {} ({})", path.display(), &digest[..12]);
                return Ok(Arc::clone(&entry.table));
            }
        }

        self.misses += 1;
        let table = read_snapshot_from(bytes.as_slice()).map_err(|e| match e {
            ExplorerError::SourceUnreadable { reason, .. } => ExplorerError::SourceUnreadable {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        let table = Arc::new(table);
        log::info!(
            "Parsed snapshot {} ({} papers, sha256 {})",
            path.display(),
            table.len(),
            &digest[..12]
        );

        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            digest,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Drop the cached snapshot so the next `load` parses again.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::debug!("Snapshot cache invalidated");
        }
    }

    /// Content hash of the cached snapshot, if any.
    pub fn digest(&self) -> Option<&str> {
        self.entry.as_ref().map(|e| e.digest.as_str())
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
