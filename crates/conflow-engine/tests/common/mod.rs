use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conflow_core::errors::Result;
use conflow_core::snapshot::Snapshot;
use conflow_core::{Document, SnapshotProvider, WorkspaceProvisioner};
use conflow_engine::EngineContext;
use conflow_store::{FsWorkspaceProvisioner, MemoryDocumentStore};
use tempfile::TempDir;
use tokio::sync::Notify;

type ReadHook = Box<dyn FnOnce(&MemoryDocumentStore) + Send>;

/// Snapshot provider over a memory store with test hooks.
///
/// - `gate`: the first read waits until notified
/// - `after_read`: runs once after the given read number (1-based)
pub struct ScriptedProvider {
    store: Arc<MemoryDocumentStore>,
    reads: AtomicUsize,
    gate: Option<Arc<Notify>>,
    after_read: Mutex<Option<(usize, ReadHook)>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(store: Arc<MemoryDocumentStore>) -> Self {
        Self {
            store,
            reads: AtomicUsize::new(0),
            gate: None,
            after_read: Mutex::new(None),
        }
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn after_read(
        self,
        read_number: usize,
        hook: impl FnOnce(&MemoryDocumentStore) + Send + 'static,
    ) -> Self {
        *self.after_read.lock().unwrap() = Some((read_number, Box::new(hook)));
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotProvider for ScriptedProvider {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if n == 1 {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
        let snapshot = self.store.read_snapshot().await?;

        let hook = {
            let mut slot = self.after_read.lock().unwrap();
            match slot.take() {
                Some((at, hook)) if at == n => Some(hook),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(hook) = hook {
            hook(self.store.as_ref());
        }
        Ok(snapshot)
    }
}

/// Provider returning a fixed snapshot.
pub struct FixedProvider(pub Snapshot);

#[async_trait]
impl SnapshotProvider for FixedProvider {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        Ok(self.0.clone())
    }
}

/// Provisioner recording every directory it was asked to create.
pub struct RecordingProvisioner {
    inner: FsWorkspaceProvisioner,
    pub created: Mutex<Vec<PathBuf>>,
}

#[allow(dead_code)]
impl RecordingProvisioner {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: FsWorkspaceProvisioner::new(root),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<PathBuf> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkspaceProvisioner for RecordingProvisioner {
    fn resolve_workspace_path(&self, effective: &Document, entity_id: &str) -> PathBuf {
        self.inner.resolve_workspace_path(effective, entity_id)
    }

    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        self.inner.ensure_directory(path).await?;
        self.created.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Engine over a memory store plus a temp workspace root.
#[allow(dead_code)]
pub fn memory_engine(store: Arc<MemoryDocumentStore>) -> (EngineContext, TempDir) {
    let root = TempDir::new().unwrap();
    let engine = EngineContext::new(
        store,
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );
    (engine, root)
}

/// Ids in `agents.list`, in order.
#[allow(dead_code)]
pub fn list_ids(doc: &Document) -> Vec<String> {
    conflow_core::entities::list_entity_entries(doc)
        .into_iter()
        .map(|entry| entry.id)
        .collect()
}
