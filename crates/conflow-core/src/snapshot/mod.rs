//! Point-in-time views of the persisted configuration document.
//!
//! A [`Snapshot`] carries three renditions of the same persisted state:
//!
//! - `raw`: the exact text on disk
//! - `parsed`: the tree as written, with placeholder tokens such as
//!   `${TELEGRAM_BOT_TOKEN}` left untouched
//! - `config`: the *effective* tree with placeholders resolved
//!
//! Writers must only ever persist edits derived from `parsed`. The effective
//! form is for reading decisions (workspace paths, defaults) only.

pub mod fingerprint;

use serde::{Deserialize, Serialize};

use crate::document::Document;

pub use fingerprint::{fingerprint, hash_text, Fingerprint};

/// A validation finding attached to a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Immutable view of the persisted document at the moment it was read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exists: bool,
    pub valid: bool,
    pub path: String,
    pub raw: Option<String>,
    pub parsed: Document,
    pub config: Document,
    pub hash: Option<Fingerprint>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub warnings: Vec<Issue>,
}

impl Snapshot {
    /// Snapshot of a document that does not exist yet.
    ///
    /// A missing document is valid and empty; the first write creates it.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            exists: false,
            valid: true,
            path: path.into(),
            raw: None,
            parsed: Document::object(),
            config: Document::object(),
            hash: None,
            issues: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Snapshot of a document whose text could not be used.
    pub fn invalid(path: impl Into<String>, raw: String, issue: Issue) -> Self {
        let hash = Some(Fingerprint::of_text(&raw));
        Self {
            exists: true,
            valid: false,
            path: path.into(),
            raw: Some(raw),
            parsed: Document::object(),
            config: Document::object(),
            hash,
            issues: vec![issue],
            warnings: Vec::new(),
        }
    }
}
