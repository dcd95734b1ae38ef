//! Conflow Core - document model and merge kernel
//!
//! This crate holds everything the configuration mutation engine needs that
//! does not touch storage:
//! - Untyped ordered document model and path addressing
//! - Three-way rebase of local edits onto a fresher document
//! - Identity-keyed merge for entity lists
//! - Snapshots and content fingerprints
//! - Collaborator traits (snapshot provider, CAS writer, workspace provisioner)
//! - Form editing session state
//! - Error and logging facilities

pub mod document;
pub mod entities;
pub mod errors;
pub mod form;
pub mod logging_facility;
pub mod provider;
pub mod rebase;
pub mod snapshot;

pub use conflow_core_types::schema;

// Re-export commonly used types
pub use document::{DocPath, Document, PathSegment};
pub use errors::{ErrorCategory, ExError, ExErrorKind, Result};
pub use form::{ConfigFormState, FormMode, RefreshOptions};
pub use provider::{DocumentWriter, SnapshotProvider, WorkspaceProvisioner};
pub use rebase::{rebase, rebase_form_edits, RebaseOp};
pub use snapshot::{fingerprint, Fingerprint, Issue, Snapshot};
