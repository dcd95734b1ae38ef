//! `${VAR}` placeholder resolution.
//!
//! Produces the *effective* form of a document. Names are upper-case
//! `[A-Z_][A-Z0-9_]*`; `$${VAR}` is an escape for a literal `${VAR}`. A
//! placeholder with no value is left in place and reported as a warning.

use std::collections::BTreeMap;

use conflow_core::document::{DocPath, Document};
use conflow_core::snapshot::Issue;
use conflow_core_types::Sensitive;

/// Values available for substitution
#[derive(Debug, Clone, Default)]
pub struct PlaceholderEnv {
    vars: BTreeMap<String, Sensitive<String>>,
}

impl PlaceholderEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), Sensitive::new(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|v| v.expose().as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Sensitive::new(v.into())))
                .collect(),
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_'
}

/// Length of a `{NAME}` group at the start of `rest`, and the name.
fn placeholder_at(rest: &str) -> Option<(usize, &str)> {
    let body = rest.strip_prefix('{')?;
    let end = body.find('}')?;
    let name = &body[..end];
    let mut chars = name.chars();
    if !chars.next().is_some_and(is_name_start) || !chars.all(is_name_char) {
        return None;
    }
    Some((end + 2, name))
}

fn resolve_text(text: &str, env: &PlaceholderEnv, missing: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(escaped) = after.strip_prefix('$') {
            if let Some((len, _)) = placeholder_at(escaped) {
                out.push('$');
                out.push_str(&escaped[..len]);
                rest = &escaped[len..];
                continue;
            }
        }

        match placeholder_at(after) {
            Some((len, name)) => {
                match env.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        missing.push(name.to_string());
                        out.push('$');
                        out.push_str(&after[..len]);
                    }
                }
                rest = &after[len..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_into(
    node: &Document,
    path: &DocPath,
    env: &PlaceholderEnv,
    warnings: &mut Vec<Issue>,
) -> Document {
    match node {
        Document::String(text) if text.contains('$') => {
            let mut missing = Vec::new();
            let resolved = resolve_text(text, env, &mut missing);
            for name in missing {
                warnings.push(Issue::new(
                    path.to_string(),
                    format!("missing env var \"{}\"", name),
                ));
            }
            Document::String(resolved)
        }
        Document::Array(items) => Document::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| resolve_into(item, &path.child_index(i), env, warnings))
                .collect(),
        ),
        Document::Object(map) => Document::Object(
            map.iter()
                .map(|(key, value)| {
                    let child = path.child_key(key.clone());
                    (key.clone(), resolve_into(value, &child, env, warnings))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Resolve placeholders throughout `doc`.
///
/// Returns the effective document and one warning per unresolved
/// placeholder. `doc` itself is not modified.
pub fn resolve_placeholders(doc: &Document, env: &PlaceholderEnv) -> (Document, Vec<Issue>) {
    let mut warnings = Vec::new();
    let effective = resolve_into(doc, &DocPath::root(), env, &mut warnings);
    (effective, warnings)
}
