//! Snapshot construction shared by the reference stores.

use conflow_core::document::Document;
use conflow_core::snapshot::{Fingerprint, Issue, Snapshot};

use crate::placeholders::{resolve_placeholders, PlaceholderEnv};

/// Build a snapshot from persisted text (`None` when nothing is stored).
///
/// The fingerprint is always the hash of `raw`. A document whose root is
/// not a mapping is reported invalid.
pub fn snapshot_from_raw(path: &str, raw: Option<String>, env: &PlaceholderEnv) -> Snapshot {
    let Some(raw) = raw else {
        return Snapshot::missing(path);
    };

    let parsed = match Document::parse(&raw) {
        Ok(parsed) => parsed,
        Err(err) => return Snapshot::invalid(path, raw, Issue::new("<root>", err.to_string())),
    };
    if !parsed.is_object() {
        return Snapshot::invalid(
            path,
            raw,
            Issue::new("<root>", "config root must be an object"),
        );
    }

    let (config, warnings) = resolve_placeholders(&parsed, env);
    Snapshot {
        exists: true,
        valid: true,
        path: path.to_string(),
        hash: Some(Fingerprint::of_text(&raw)),
        raw: Some(raw),
        parsed,
        config,
        issues: Vec::new(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing() {
        let snapshot = snapshot_from_raw("c.json", None, &PlaceholderEnv::new());
        assert!(!snapshot.exists);
        assert!(snapshot.valid);
    }

    #[test]
    fn test_parsed_keeps_placeholders_config_resolves() {
        let env = PlaceholderEnv::new().with_var("TOKEN", "secret");
        let raw = r#"{"channels": {"telegram": {"botToken": "${TOKEN}"}}}"#.to_string();
        let snapshot = snapshot_from_raw("c.json", Some(raw.clone()), &env);

        assert!(snapshot.valid);
        assert_eq!(snapshot.hash, Some(Fingerprint::of_text(&raw)));
        let token = |doc: &Document| {
            doc.get("channels")
                .and_then(|c| c.get("telegram"))
                .and_then(|t| t.get("botToken"))
                .and_then(Document::as_str)
                .map(str::to_string)
        };
        assert_eq!(token(&snapshot.parsed).as_deref(), Some("${TOKEN}"));
        assert_eq!(token(&snapshot.config).as_deref(), Some("secret"));
    }

    #[test]
    fn test_non_object_root_is_invalid() {
        let snapshot = snapshot_from_raw("c.json", Some("[1, 2]".to_string()), &PlaceholderEnv::new());
        assert!(snapshot.exists);
        assert!(!snapshot.valid);
        assert!(snapshot.hash.is_some());
    }

    #[test]
    fn test_unparseable_is_invalid() {
        let snapshot = snapshot_from_raw("c.json", Some("{".to_string()), &PlaceholderEnv::new());
        assert!(!snapshot.valid);
        assert_eq!(snapshot.issues.len(), 1);
    }
}
