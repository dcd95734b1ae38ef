//! Managed entity list helpers.
//!
//! Entities live in the `agents.list` sequence of the configuration document
//! as `{ "id": ..., "name"?: ... }` mappings. Ids are unique after
//! normalization.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::{DocMap, Document};
use crate::errors::{ExError, ExErrorKind, Result};

/// Top-level key holding entity settings
pub const ENTITIES_KEY: &str = "agents";
/// Key of the entity sequence under [`ENTITIES_KEY`]
pub const ENTITY_LIST_KEY: &str = "list";
/// Id reported as default when the list is empty
pub const DEFAULT_ENTITY_ID: &str = "main";

const MAX_ENTITY_ID_LEN: usize = 64;

/// One element of the entity list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

/// Canonicalize a requested entity id.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9_-]` into a
/// single `-`, strips leading and trailing `-` and caps the length at 64.
pub fn normalize_entity_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidRequest)
            .with_op("normalize_entity_id")
            .with_message("entity id is required"));
    }

    let mut id = String::with_capacity(trimmed.len());
    let mut in_run = false;
    for ch in trimmed.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
            id.push(ch);
            in_run = false;
        } else if !in_run {
            id.push('-');
            in_run = true;
        }
    }

    let id: String = id
        .trim_matches('-')
        .chars()
        .take(MAX_ENTITY_ID_LEN)
        .collect();
    if id.is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidRequest)
            .with_op("normalize_entity_id")
            .with_message(format!("entity id '{}' has no usable characters", trimmed)));
    }
    Ok(id)
}

/// Trim a display name; blank names count as absent.
pub fn normalize_display_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn entity_items(config: &Document) -> &[Document] {
    config
        .get(ENTITIES_KEY)
        .and_then(|agents| agents.get(ENTITY_LIST_KEY))
        .and_then(Document::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Entries of the entity list; elements without a usable id are skipped.
pub fn list_entity_entries(config: &Document) -> Vec<EntityEntry> {
    entity_items(config)
        .iter()
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?.trim();
            if id.is_empty() {
                return None;
            }
            Some(EntityEntry {
                id: id.to_string(),
                name: normalize_display_name(item.get("name").and_then(Document::as_str)),
                default: item.get("default").and_then(Document::as_bool) == Some(true),
            })
        })
        .collect()
}

/// Normalized ids present in the entity list.
pub fn list_entity_ids(config: &Document) -> BTreeSet<String> {
    list_entity_entries(config)
        .iter()
        .filter_map(|entry| normalize_entity_id(&entry.id).ok())
        .collect()
}

/// Union of the ids visible in the effective and the as-written trees.
///
/// Both are consulted so an entry hidden by include resolution or
/// placeholder substitution still counts as taken.
pub fn known_entity_ids(effective: &Document, parsed: &Document) -> BTreeSet<String> {
    let mut ids = list_entity_ids(effective);
    ids.extend(list_entity_ids(parsed));
    ids
}

/// The default entity: first flagged `default`, else first, else `main`.
pub fn default_entity_id(config: &Document) -> String {
    let entries = list_entity_entries(config);
    entries
        .iter()
        .find(|entry| entry.default)
        .or_else(|| entries.first())
        .map(|entry| entry.id.clone())
        .unwrap_or_else(|| DEFAULT_ENTITY_ID.to_string())
}

/// The list element for `id`, if present.
pub fn find_entity<'a>(config: &'a Document, id: &str) -> Option<&'a Document> {
    entity_items(config).iter().find(|item| {
        item.get("id")
            .and_then(Document::as_str)
            .and_then(|raw| normalize_entity_id(raw).ok())
            .is_some_and(|normalized| normalized == id)
    })
}

/// Return a copy of `doc` with `{id, name?}` appended to the entity list.
///
/// `agents` and `agents.list` are created (or replaced) when absent or of
/// the wrong shape. Every other key is left as it was.
pub fn add_entity_entry(doc: &Document, id: &str, name: Option<&str>) -> Document {
    let mut next = match doc {
        Document::Object(map) => map.clone(),
        _ => DocMap::new(),
    };

    let mut entry = DocMap::new();
    entry.insert("id".to_string(), Document::from(id));
    if let Some(name) = name {
        entry.insert("name".to_string(), Document::from(name));
    }

    let agents = next
        .entry(ENTITIES_KEY.to_string())
        .or_insert_with(Document::object);
    if !agents.is_object() {
        *agents = Document::object();
    }
    if let Some(agents) = agents.as_object_mut() {
        let list = agents
            .entry(ENTITY_LIST_KEY.to_string())
            .or_insert_with(|| Document::Array(Vec::new()));
        if !list.is_array() {
            *list = Document::Array(Vec::new());
        }
        if let Some(items) = list.as_array_mut() {
            items.push(Document::Object(entry));
        }
    }

    Document::Object(next)
}
