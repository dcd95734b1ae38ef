use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use conflow_core::errors::{ExError, ExErrorKind, Result};
use conflow_core::snapshot::{Fingerprint, Issue, Snapshot};
use conflow_core::{Document, DocumentWriter, SnapshotProvider};

pub const CONFIG_PATH: &str = "/tmp/conflow-test.json";

/// In-process store holding raw text, with a CAS check on writes.
///
/// Parsed and effective forms are identical (no placeholder resolution).
pub struct FakeStore {
    raw: Mutex<Option<String>>,
    fail_reads: AtomicBool,
}

#[allow(dead_code)]
impl FakeStore {
    pub fn with_json(text: &str) -> Self {
        Self {
            raw: Mutex::new(Some(text.to_string())),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        Self {
            raw: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Simulate another writer replacing the document.
    pub fn external_write(&self, text: &str) {
        *self.raw.lock().unwrap() = Some(text.to_string());
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap().clone()
    }

    pub fn document(&self) -> Document {
        Document::parse(&self.raw().unwrap()).unwrap()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotProvider for FakeStore {
    async fn read_snapshot(&self) -> Result<Snapshot> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ExError::new(ExErrorKind::Io).with_message("store offline"));
        }
        let Some(raw) = self.raw() else {
            return Ok(Snapshot::missing(CONFIG_PATH));
        };
        match Document::parse(&raw) {
            Ok(doc) => Ok(Snapshot {
                exists: true,
                valid: true,
                path: CONFIG_PATH.to_string(),
                hash: Some(Fingerprint::of_text(&raw)),
                raw: Some(raw),
                parsed: doc.clone(),
                config: doc,
                issues: Vec::new(),
                warnings: Vec::new(),
            }),
            Err(err) => Ok(Snapshot::invalid(
                CONFIG_PATH,
                raw,
                Issue::new("<root>", err.to_string()),
            )),
        }
    }
}

#[async_trait]
impl DocumentWriter for FakeStore {
    async fn write_document(
        &self,
        doc: &Document,
        expected_base_hash: Option<&Fingerprint>,
    ) -> Result<()> {
        let mut raw = self.raw.lock().unwrap();
        let actual = raw.as_deref().map(Fingerprint::of_text);
        if actual.as_ref() != expected_base_hash {
            return Err(ExError::new(ExErrorKind::BaseHashMismatch)
                .with_message("config changed since last load"));
        }
        *raw = Some(doc.to_pretty_string()?);
        Ok(())
    }
}
