//! Three-way rebase of local document edits onto a fresher document.
//!
//! Given `base` (the document when editing began), `current` (after local
//! edits) and `latest` (freshly fetched), [`rebase`] computes the edits
//! `current` made relative to `base` and replays them onto `latest`.
//!
//! ## Entry points
//!
//! ```
//! use conflow_core::document::Document;
//! use conflow_core::rebase::rebase;
//!
//! let base = Document::parse(r#"{"a": 1, "b": 1}"#).unwrap();
//! let current = Document::parse(r#"{"a": 2, "b": 1}"#).unwrap();
//! let latest = Document::parse(r#"{"a": 1, "b": 3}"#).unwrap();
//!
//! let merged = rebase(&base, &current, &latest);
//! assert_eq!(merged, Document::parse(r#"{"a": 2, "b": 3}"#).unwrap());
//! ```
//!
//! ## Guarantees
//!
//! - **Purity**: no I/O, no shared state, never fails.
//! - **No local edits**: `rebase(d, d, l) == l`.
//! - **No remote edits**: `rebase(d, c, d) == c`.
//! - **Keyed lists**: sequences of uniquely id-keyed records merge by id,
//!   not by position (see [`stable_array`]).
//! - **Structural collisions**: an edit whose target no longer has the
//!   expected container shape in `latest` is dropped.

pub mod engine;
pub mod model;
pub mod stable_array;

pub use engine::{apply_rebase_ops, collect_rebase_ops, rebase, rebase_form_edits};
pub use model::RebaseOp;
pub use stable_array::{index_stable_array, merge_stable_array, StableArrayIndex};
