//! Rebase operation types.

use crate::document::{DocPath, Document};

/// One edit recovered from diffing `base` against `current`.
///
/// Ops live for a single rebase call and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum RebaseOp {
    /// Write `value` at `path`
    Set { path: DocPath, value: Document },
    /// Delete whatever is at `path`
    Remove { path: DocPath },
    /// Merge a keyed list by id against whatever `latest` holds at `path`
    MergeStableArray {
        path: DocPath,
        base: Vec<Document>,
        current: Vec<Document>,
    },
}

impl RebaseOp {
    pub fn path(&self) -> &DocPath {
        match self {
            RebaseOp::Set { path, .. }
            | RebaseOp::Remove { path }
            | RebaseOp::MergeStableArray { path, .. } => path,
        }
    }

    /// Short label used in trace output
    pub fn label(&self) -> &'static str {
        match self {
            RebaseOp::Set { .. } => "set",
            RebaseOp::Remove { .. } => "remove",
            RebaseOp::MergeStableArray { .. } => "merge_stable_array",
        }
    }
}
