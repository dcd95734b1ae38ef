//! Collaborator interfaces consumed by the mutation engine and form session.
//!
//! The engine never touches storage directly. Reference implementations live
//! in the `conflow-store` crate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::document::Document;
use crate::errors::Result;
use crate::snapshot::{Fingerprint, Snapshot};

/// Read-only access to the persisted configuration document.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Read the current persisted state.
    ///
    /// # Errors
    ///
    /// Only for failures reading the backing store. A document that exists
    /// but does not parse is reported as a snapshot with `valid == false`.
    async fn read_snapshot(&self) -> Result<Snapshot>;
}

/// Compare-and-swap persistence of a whole document.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Persist `doc` if the stored content still fingerprints to
    /// `expected_base_hash`. `None` expects the document not to exist.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::BaseHashMismatch` when the stored content moved; the
    /// store is left untouched in that case.
    async fn write_document(
        &self,
        doc: &Document,
        expected_base_hash: Option<&Fingerprint>,
    ) -> Result<()>;

    /// Persist raw text under the same CAS rule.
    ///
    /// The default parses `raw` and delegates to [`write_document`].
    ///
    /// [`write_document`]: DocumentWriter::write_document
    async fn write_raw(&self, raw: &str, expected_base_hash: Option<&Fingerprint>) -> Result<()> {
        let doc = Document::parse(raw)?;
        self.write_document(&doc, expected_base_hash).await
    }
}

/// Workspace directory policy for managed entities.
#[async_trait]
pub trait WorkspaceProvisioner: Send + Sync {
    /// Where `entity_id`'s workspace lives, given the effective config.
    fn resolve_workspace_path(&self, effective: &Document, entity_id: &str) -> PathBuf;

    /// Create `path` (and parents). Succeeds if it already exists.
    async fn ensure_directory(&self, path: &Path) -> Result<()>;
}
