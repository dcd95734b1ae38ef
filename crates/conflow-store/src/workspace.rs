//! Filesystem workspace provisioner
//!
//! Resolution order for an entity's workspace directory:
//! 1. the `workspace` field of its own list entry
//! 2. `agents.defaults.workspace`, for the default entity only
//! 3. `<root>/workspace-<id>`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use conflow_core::document::Document;
use conflow_core::entities::{default_entity_id, find_entity, ENTITIES_KEY};
use conflow_core::provider::WorkspaceProvisioner;

use crate::errors::{io_error, Result};

pub struct FsWorkspaceProvisioner {
    root: PathBuf,
}

impl FsWorkspaceProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn non_blank(value: Option<&Document>) -> Option<&str> {
    value
        .and_then(Document::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl WorkspaceProvisioner for FsWorkspaceProvisioner {
    fn resolve_workspace_path(&self, effective: &Document, entity_id: &str) -> PathBuf {
        if let Some(dir) = non_blank(find_entity(effective, entity_id).and_then(|e| e.get("workspace")))
        {
            return PathBuf::from(dir);
        }
        if default_entity_id(effective) == entity_id {
            let defaults = effective
                .get(ENTITIES_KEY)
                .and_then(|agents| agents.get("defaults"))
                .and_then(|defaults| defaults.get("workspace"));
            if let Some(dir) = non_blank(defaults) {
                return PathBuf::from(dir);
            }
        }
        self.root.join(format!("workspace-{}", entity_id))
    }

    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| io_error("ensure_workspace", e))?;
        tracing::debug!(path = %path.display(), "workspace directory ready");
        Ok(())
    }
}
