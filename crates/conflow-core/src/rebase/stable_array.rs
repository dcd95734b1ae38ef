//! Identity-keyed merge for sequences of `{id, ...}` mappings.
//!
//! Positional diffing of an entity list goes wrong as soon as someone else
//! inserts or deletes an element. Lists whose elements all carry a unique
//! non-empty `id` are merged by that key instead.

use std::collections::HashMap;

use crate::document::Document;
use crate::rebase::engine::rebase;

/// Key-indexed view over a stable array
#[derive(Debug, Clone)]
pub struct StableArrayIndex<'a> {
    order: Vec<&'a str>,
    by_key: HashMap<&'a str, &'a Document>,
}

impl<'a> StableArrayIndex<'a> {
    /// Keys in their original sequence order
    pub fn order(&self) -> &[&'a str] {
        &self.order
    }

    pub fn get(&self, key: &str) -> Option<&'a Document> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The trimmed `id` of an element, when it has a usable one.
pub fn stable_key(item: &Document) -> Option<&str> {
    let id = item.get("id")?.as_str()?.trim();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Index `items` by id, or `None` if any element lacks a key or a key repeats.
pub fn index_stable_array(items: &[Document]) -> Option<StableArrayIndex<'_>> {
    let mut order = Vec::with_capacity(items.len());
    let mut by_key = HashMap::with_capacity(items.len());
    for item in items {
        let key = stable_key(item)?;
        if by_key.insert(key, item).is_some() {
            return None;
        }
        order.push(key);
    }
    Some(StableArrayIndex { order, by_key })
}

/// Three-way merge of a keyed list.
///
/// Returns `current` unchanged if any of the three sides is not a stable
/// array. `latest` is `None` when the path no longer resolves.
pub fn merge_stable_array(
    base: &[Document],
    current: &[Document],
    latest: Option<&Document>,
) -> Vec<Document> {
    let (Some(base_index), Some(current_index)) =
        (index_stable_array(base), index_stable_array(current))
    else {
        return current.to_vec();
    };
    let Some(latest_items) = latest.and_then(Document::as_array) else {
        return current.to_vec();
    };
    let Some(latest_index) = index_stable_array(latest_items) else {
        return current.to_vec();
    };

    let mut merged: HashMap<&str, Document> = latest_index
        .order()
        .iter()
        .filter_map(|key| latest_index.get(key).map(|item| (*key, item.clone())))
        .collect();

    for key in base_index.order() {
        if !current_index.contains(key) {
            merged.remove(key);
        }
    }

    for key in current_index.order() {
        let Some(current_item) = current_index.get(key) else {
            continue;
        };
        let next = match (base_index.get(key), merged.get(key)) {
            (None, Some(latest_item)) => rebase(&Document::object(), current_item, latest_item),
            (None, None) => current_item.clone(),
            (Some(base_item), _) if base_item == current_item => continue,
            (Some(base_item), Some(latest_item)) => rebase(base_item, current_item, latest_item),
            (Some(_), None) => current_item.clone(),
        };
        merged.insert(*key, next);
    }

    let mut out = Vec::with_capacity(merged.len());
    for key in current_index.order() {
        if let Some(item) = merged.remove(key) {
            out.push(item);
        }
    }
    for key in latest_index.order() {
        if let Some(item) = merged.remove(key) {
            out.push(item);
        }
    }
    out
}
