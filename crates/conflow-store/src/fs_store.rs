//! JSON file store
//!
//! Reads produce a [`Snapshot`] with the raw text, the as-written tree and
//! the placeholder-resolved tree. Writes are compare-and-swap against the
//! fingerprint of the text currently on disk, then persisted with
//! temp→rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use conflow_core::document::Document;
use conflow_core::provider::{DocumentWriter, SnapshotProvider};
use conflow_core::snapshot::{Fingerprint, Snapshot};
use tokio::sync::Mutex;

use crate::atomic::atomic_write;
use crate::errors::{base_hash_mismatch, io_error, serialize_error, Result};
use crate::placeholders::PlaceholderEnv;
use crate::snapshot::snapshot_from_raw;

/// File-backed configuration store
pub struct FsDocumentStore {
    path: PathBuf,
    env: PlaceholderEnv,
    // Held across compare and rename so in-process writers cannot interleave.
    write_lock: Mutex<()>,
}

impl FsDocumentStore {
    /// Create a store for the document at `path` (need not exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: PlaceholderEnv::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use `env` to resolve `${VAR}` placeholders in the effective form
    pub fn with_env(mut self, env: PlaceholderEnv) -> Self {
        self.env = env;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read_config", e)),
        }
    }
}

#[async_trait]
impl SnapshotProvider for FsDocumentStore {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        let raw = self.read_raw().await?;
        Ok(snapshot_from_raw(
            &self.path.to_string_lossy(),
            raw,
            &self.env,
        ))
    }
}

#[async_trait]
impl DocumentWriter for FsDocumentStore {
    async fn write_document(
        &self,
        doc: &Document,
        expected_base_hash: Option<&Fingerprint>,
    ) -> Result<()> {
        let text = doc.to_pretty_string().map_err(serialize_error)?;

        let _guard = self.write_lock.lock().await;
        let actual = self.read_raw().await?.as_deref().map(Fingerprint::of_text);
        if actual.as_ref() != expected_base_hash {
            tracing::debug!(
                path = %self.path.display(),
                "rejected write: base hash mismatch"
            );
            return Err(base_hash_mismatch(expected_base_hash, actual.as_ref()));
        }

        atomic_write(&self.path, text.as_bytes()).await?;
        tracing::debug!(
            path = %self.path.display(),
            bytes = text.len(),
            "config written"
        );
        Ok(())
    }
}
