//! Addressing nodes inside a [`Document`].
//!
//! Writes through a path never replace an ancestor of the wrong shape: if a
//! scalar sits where a container is needed, or a mapping is addressed by
//! index, the write is dropped and `false` is returned.

use std::fmt;

use super::{DocMap, Document};

/// One step of a document path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a node, root-relative
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Build from a dotted key path such as `agents.list`
    pub fn from_dotted(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(PathSegment::from)
                .collect(),
        )
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Read the node at `path`, if every step resolves.
pub fn get_path<'a>(root: &'a Document, path: &DocPath) -> Option<&'a Document> {
    let mut current = root;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), Document::Object(map)) => map.get(key)?,
            (PathSegment::Index(index), Document::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn empty_container_for(next: &PathSegment) -> Document {
    match next {
        PathSegment::Index(_) => Document::Array(Vec::new()),
        PathSegment::Key(_) => Document::Object(DocMap::new()),
    }
}

fn shape_fits(node: &Document, next: &PathSegment) -> bool {
    matches!(
        (next, node),
        (PathSegment::Key(_), Document::Object(_)) | (PathSegment::Index(_), Document::Array(_))
    )
}

/// Write `value` at `path`, creating missing intermediate containers.
///
/// An index at or past the end of a sequence appends. Returns `false` when
/// the write was dropped because an ancestor had the wrong shape. A root
/// path replaces the whole document.
pub fn set_path(root: &mut Document, path: &DocPath, value: Document) -> bool {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return true;
    };

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        let next = segments.get(i + 1).unwrap_or(last);
        let child = match (segment, current) {
            (PathSegment::Key(key), Document::Object(map)) => map
                .entry(key.clone())
                .or_insert_with(|| empty_container_for(next)),
            (PathSegment::Index(index), Document::Array(items)) => {
                if *index >= items.len() {
                    items.push(empty_container_for(next));
                    let end = items.len() - 1;
                    &mut items[end]
                } else {
                    &mut items[*index]
                }
            }
            _ => return false,
        };
        if !shape_fits(child, next) {
            return false;
        }
        current = child;
    }

    match (last, current) {
        (PathSegment::Key(key), Document::Object(map)) => {
            map.insert(key.clone(), value);
            true
        }
        (PathSegment::Index(index), Document::Array(items)) => {
            if *index < items.len() {
                items[*index] = value;
            } else {
                items.push(value);
            }
            true
        }
        _ => false,
    }
}

/// Remove the node at `path`. Returns `false` when nothing was there.
///
/// Mapping removal keeps the order of the remaining keys; sequence removal
/// shifts later elements down. The root cannot be removed through this
/// function.
pub fn remove_path(root: &mut Document, path: &DocPath) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        return false;
    };

    let mut current = root;
    for segment in parents {
        current = match (segment, current) {
            (PathSegment::Key(key), Document::Object(map)) => match map.get_mut(key) {
                Some(child) => child,
                None => return false,
            },
            (PathSegment::Index(index), Document::Array(items)) => match items.get_mut(*index) {
                Some(child) => child,
                None => return false,
            },
            _ => return false,
        };
    }

    match (last, current) {
        (PathSegment::Key(key), Document::Object(map)) => map.shift_remove(key).is_some(),
        (PathSegment::Index(index), Document::Array(items)) if *index < items.len() => {
            items.remove(*index);
            true
        }
        _ => false,
    }
}
