//! Collaborators shared by engine commands.

use std::path::PathBuf;
use std::sync::Arc;

use conflow_core::provider::{DocumentWriter, SnapshotProvider, WorkspaceProvisioner};
use conflow_store::{FsDocumentStore, FsWorkspaceProvisioner, PlaceholderEnv};

use crate::queue::MutationQueue;

/// Queue plus storage collaborators for one configuration document
#[derive(Clone)]
pub struct EngineContext {
    pub queue: Arc<MutationQueue>,
    pub provider: Arc<dyn SnapshotProvider>,
    pub writer: Arc<dyn DocumentWriter>,
    pub provisioner: Arc<dyn WorkspaceProvisioner>,
}

impl EngineContext {
    /// Context over a store that both reads and writes, with a fresh queue
    pub fn new<S>(store: Arc<S>, provisioner: Arc<dyn WorkspaceProvisioner>) -> Self
    where
        S: SnapshotProvider + DocumentWriter + 'static,
    {
        Self {
            queue: Arc::new(MutationQueue::new()),
            provider: store.clone(),
            writer: store,
            provisioner,
        }
    }

    /// Context over a JSON file, resolving placeholders from `env`
    pub fn open_file(
        config_path: impl Into<PathBuf>,
        workspace_root: impl Into<PathBuf>,
        env: PlaceholderEnv,
    ) -> Self {
        let store = Arc::new(FsDocumentStore::new(config_path).with_env(env));
        Self::new(store, Arc::new(FsWorkspaceProvisioner::new(workspace_root)))
    }

    /// Context with separately supplied reader and writer
    pub fn from_parts(
        provider: Arc<dyn SnapshotProvider>,
        writer: Arc<dyn DocumentWriter>,
        provisioner: Arc<dyn WorkspaceProvisioner>,
    ) -> Self {
        Self {
            queue: Arc::new(MutationQueue::new()),
            provider,
            writer,
            provisioner,
        }
    }

    /// Share an existing queue (several contexts over the same document)
    pub fn with_queue(mut self, queue: Arc<MutationQueue>) -> Self {
        self.queue = queue;
        self
    }
}
