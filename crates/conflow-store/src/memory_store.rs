//! In-memory configuration store
//!
//! Same snapshot and CAS semantics as [`FsDocumentStore`] without touching
//! the filesystem.
//!
//! [`FsDocumentStore`]: crate::FsDocumentStore

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use conflow_core::document::Document;
use conflow_core::errors::{ExError, ExErrorKind};
use conflow_core::provider::{DocumentWriter, SnapshotProvider};
use conflow_core::snapshot::{Fingerprint, Snapshot};

use crate::errors::{base_hash_mismatch, serialize_error, Result};
use crate::placeholders::PlaceholderEnv;
use crate::snapshot::snapshot_from_raw;

const MEMORY_PATH: &str = "memory://config.json";

pub struct MemoryDocumentStore {
    raw: Mutex<Option<String>>,
    env: PlaceholderEnv,
    writes: AtomicUsize,
    reject_next_write: AtomicBool,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// An empty store; the document does not exist yet
    pub fn new() -> Self {
        Self {
            raw: Mutex::new(None),
            env: PlaceholderEnv::new(),
            writes: AtomicUsize::new(0),
            reject_next_write: AtomicBool::new(false),
        }
    }

    /// A store holding `raw` verbatim
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            ..Self::new()
        }
    }

    pub fn with_env(mut self, env: PlaceholderEnv) -> Self {
        self.env = env;
        self
    }

    /// Test hook: overwrite the stored text as an outside writer would,
    /// bypassing CAS and the write counter.
    ///
    /// # Errors
    ///
    /// `Internal` if the lock is poisoned, like every other access path.
    pub fn replace_raw(&self, raw: impl Into<String>) -> Result<()> {
        let mut slot = self.raw.lock().map_err(|_| Self::lock_poisoned())?;
        *slot = Some(raw.into());
        Ok(())
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|slot| slot.clone())
    }

    /// The stored document, if present and parseable
    pub fn document(&self) -> Option<Document> {
        self.raw().and_then(|raw| Document::parse(&raw).ok())
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next write fail with a base hash mismatch, leaving the
    /// stored text untouched.
    pub fn reject_next_write(&self) {
        self.reject_next_write.store(true, Ordering::SeqCst);
    }

    fn lock_poisoned() -> ExError {
        ExError::new(ExErrorKind::Internal).with_message("memory store lock poisoned")
    }
}

#[async_trait]
impl SnapshotProvider for MemoryDocumentStore {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        let raw = self
            .raw
            .lock()
            .map_err(|_| Self::lock_poisoned())?
            .clone();
        Ok(snapshot_from_raw(MEMORY_PATH, raw, &self.env))
    }
}

#[async_trait]
impl DocumentWriter for MemoryDocumentStore {
    async fn write_document(
        &self,
        doc: &Document,
        expected_base_hash: Option<&Fingerprint>,
    ) -> Result<()> {
        let text = doc.to_pretty_string().map_err(serialize_error)?;
        let mut slot = self.raw.lock().map_err(|_| Self::lock_poisoned())?;
        let actual = slot.as_deref().map(Fingerprint::of_text);

        if self.reject_next_write.swap(false, Ordering::SeqCst) {
            return Err(base_hash_mismatch(expected_base_hash, actual.as_ref()));
        }
        if actual.as_ref() != expected_base_hash {
            return Err(base_hash_mismatch(expected_base_hash, actual.as_ref()));
        }

        *slot = Some(text);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
