//! Conflow Store - reference collaborators for the mutation engine
//!
//! Provides:
//! - JSON file store with CAS writes and atomic temp→rename persistence
//! - In-memory store for tests and embedding
//! - `${VAR}` placeholder resolution for the effective form
//! - Filesystem workspace provisioner

pub mod atomic;
pub mod errors;
pub mod fs_store;
pub mod memory_store;
pub mod placeholders;
pub mod snapshot;
pub mod workspace;

// Re-export key types
pub use errors::Result;
pub use fs_store::FsDocumentStore;
pub use memory_store::MemoryDocumentStore;
pub use placeholders::PlaceholderEnv;
pub use workspace::FsWorkspaceProvisioner;
