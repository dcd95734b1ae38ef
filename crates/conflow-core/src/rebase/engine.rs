//! Diff collection and replay.
//!
//! The core entry point is [`rebase`]. [`collect_rebase_ops`] and
//! [`apply_rebase_ops`] are exposed for callers that want to inspect the
//! recovered edits.

use crate::document::{get_path, remove_path, set_path, DocPath, Document};
use crate::rebase::model::RebaseOp;
use crate::rebase::stable_array::{index_stable_array, merge_stable_array};

/// Recover the edits that turn `base` into `current`.
///
/// Walks both trees depth-first. Equal subtrees produce nothing. A pair of
/// keyed lists produces a single [`RebaseOp::MergeStableArray`] for the
/// whole list; other lists are compared by position.
pub fn collect_rebase_ops(base: &Document, current: &Document) -> Vec<RebaseOp> {
    let mut ops = Vec::new();
    collect_into(base, current, &DocPath::root(), &mut ops);
    ops
}

fn collect_into(base: &Document, next: &Document, path: &DocPath, ops: &mut Vec<RebaseOp>) {
    if base == next {
        return;
    }
    match (base, next) {
        (Document::Array(base_items), Document::Array(next_items)) => {
            if index_stable_array(base_items).is_some() && index_stable_array(next_items).is_some()
            {
                ops.push(RebaseOp::MergeStableArray {
                    path: path.clone(),
                    base: base_items.clone(),
                    current: next_items.clone(),
                });
                return;
            }

            let shared = base_items.len().min(next_items.len());
            for index in 0..shared {
                collect_into(
                    &base_items[index],
                    &next_items[index],
                    &path.child_index(index),
                    ops,
                );
            }
            if next_items.len() > base_items.len() {
                for (index, item) in next_items.iter().enumerate().skip(shared) {
                    ops.push(RebaseOp::Set {
                        path: path.child_index(index),
                        value: item.clone(),
                    });
                }
                return;
            }
            // Highest index first so each removal leaves earlier indices valid.
            for index in (next_items.len()..base_items.len()).rev() {
                ops.push(RebaseOp::Remove {
                    path: path.child_index(index),
                });
            }
        }
        (Document::Array(_), _) | (_, Document::Array(_)) => {
            ops.push(RebaseOp::Set {
                path: path.clone(),
                value: next.clone(),
            });
        }
        (Document::Object(base_map), Document::Object(next_map)) => {
            for key in base_map.keys() {
                if !next_map.contains_key(key) {
                    ops.push(RebaseOp::Remove {
                        path: path.child_key(key.clone()),
                    });
                }
            }
            for (key, value) in next_map {
                let child = path.child_key(key.clone());
                match base_map.get(key) {
                    Some(base_value) => collect_into(base_value, value, &child, ops),
                    None => ops.push(RebaseOp::Set {
                        path: child,
                        value: value.clone(),
                    }),
                }
            }
        }
        _ => {
            ops.push(RebaseOp::Set {
                path: path.clone(),
                value: next.clone(),
            });
        }
    }
}

/// Replay `ops` onto a copy of `latest`.
///
/// Ops whose target no longer has a container of the expected shape are
/// skipped. A root-level `Remove` leaves an empty mapping.
pub fn apply_rebase_ops(latest: &Document, ops: &[RebaseOp]) -> Document {
    let mut rebased = latest.clone();
    for op in ops {
        match op {
            RebaseOp::MergeStableArray {
                path,
                base,
                current,
            } => {
                let merged = merge_stable_array(base, current, get_path(&rebased, path));
                if path.is_root() {
                    rebased = Document::Array(merged);
                } else if rebased.is_object() || rebased.is_array() {
                    set_path(&mut rebased, path, Document::Array(merged));
                }
            }
            RebaseOp::Set { path, value } if path.is_root() => {
                rebased = value.clone();
            }
            RebaseOp::Remove { path } if path.is_root() => {
                rebased = Document::object();
            }
            _ if !(rebased.is_object() || rebased.is_array()) => {}
            RebaseOp::Set { path, value } => {
                if !set_path(&mut rebased, path, value.clone()) {
                    tracing::trace!(path = %path, "dropped set: target shape changed upstream");
                }
            }
            RebaseOp::Remove { path } => {
                remove_path(&mut rebased, path);
            }
        }
    }
    rebased
}

/// Replay the edits `current` made relative to `base` onto `latest`.
///
/// Returns `latest` unchanged when there are no local edits.
pub fn rebase(base: &Document, current: &Document, latest: &Document) -> Document {
    if base == current {
        return latest.clone();
    }
    let ops = collect_rebase_ops(base, current);
    tracing::trace!(op_count = ops.len(), "replaying local edits");
    apply_rebase_ops(latest, &ops)
}

/// Rebase a form document; the result is always a mapping.
///
/// Falls back to `latest` if replay produced anything other than a mapping.
pub fn rebase_form_edits(original: &Document, current: &Document, latest: &Document) -> Document {
    let ops = collect_rebase_ops(original, current);
    let rebased = apply_rebase_ops(latest, &ops);
    if rebased.is_object() {
        rebased
    } else {
        latest.clone()
    }
}
