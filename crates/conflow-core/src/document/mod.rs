//! Untyped configuration document model.
//!
//! A [`Document`] is the tree every engine operation works on: an ordered
//! mapping, a sequence, or a scalar. Mapping keys keep their insertion order
//! so a document written back to disk keeps the layout a human gave it.
//! Equality on mappings ignores key order.

pub mod path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::DocumentError;

pub use path::{get_path, remove_path, set_path, DocPath, PathSegment};

/// Ordered mapping used for document objects
pub type DocMap = IndexMap<String, Document>;

/// A schema-less configuration tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Document>),
    Object(DocMap),
}

impl Default for Document {
    fn default() -> Self {
        Document::Null
    }
}

impl Document {
    /// An empty mapping
    pub fn object() -> Self {
        Document::Object(DocMap::new())
    }

    /// Parse JSON text into a document, preserving key order.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text).map_err(DocumentError::from_parse)
    }

    /// Render as pretty-printed JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Document::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Document::Array(_))
    }

    pub fn as_object(&self) -> Option<&DocMap> {
        match self {
            Document::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut DocMap> {
        match self {
            Document::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Document>> {
        match self {
            Document::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Document>> {
        match self {
            Document::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key when this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(n),
            Value::String(s) => Document::String(s),
            Value::Array(items) => Document::Array(items.into_iter().map(Document::from).collect()),
            Value::Object(map) => Document::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Document::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(b),
            Document::Number(n) => Value::Number(n),
            Document::String(s) => Value::String(s),
            Document::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Document::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}
