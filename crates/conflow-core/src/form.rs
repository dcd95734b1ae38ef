//! Client-side form session over the configuration document.
//!
//! A [`ConfigFormState`] caches one snapshot, lets the user edit a copy of
//! its as-written tree (or the raw text), and saves with the cached
//! snapshot's fingerprint as the CAS token. The form never holds the
//! effective tree, so `${VAR}` tokens survive a save; the resolved values
//! are available through [`ConfigFormState::effective_config`] for display.
//! [`ConfigFormState::refresh_snapshot_hash`] lets a long-lived session
//! catch up with other writers without throwing away unsaved edits.
//!
//! Collaborator failures never escape these methods; they are recorded in
//! `last_error` for display.

use crate::document::{remove_path, set_path, DocPath, Document};
use crate::errors::{ExError, ExErrorKind};
use crate::provider::{DocumentWriter, SnapshotProvider};
use crate::rebase::rebase_form_edits;
use crate::snapshot::{fingerprint, Fingerprint, Issue, Snapshot};

/// Message recorded when saving without a usable base hash
pub const HASH_MISSING_MESSAGE: &str = "config hash missing; reload and retry";

/// Which representation the user is editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Form,
    Raw,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Rebase a dirty form onto the fresh snapshot instead of leaving it
    /// pinned to its old base.
    pub rebase_dirty_form: bool,
}

impl RefreshOptions {
    pub fn rebase() -> Self {
        Self {
            rebase_dirty_form: true,
        }
    }
}

/// Editing session state
#[derive(Debug, Clone, Default)]
pub struct ConfigFormState {
    pub snapshot: Option<Snapshot>,
    pub raw: String,
    pub raw_original: String,
    pub valid: Option<bool>,
    pub issues: Vec<Issue>,
    pub form: Option<Document>,
    pub form_original: Option<Document>,
    pub form_dirty: bool,
    pub form_mode: FormMode,
    pub loading: bool,
    pub saving: bool,
    pub last_error: Option<String>,
}

fn serialize_form(form: &Document) -> Result<String, ExError> {
    Ok(form.to_pretty_string()?)
}

impl ConfigFormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint of the cached snapshot; the CAS token for [`save`].
    ///
    /// [`save`]: ConfigFormState::save
    pub fn base_hash(&self) -> Option<Fingerprint> {
        self.snapshot.as_ref().and_then(fingerprint)
    }

    /// Placeholder-resolved view of the cached snapshot. Read-only.
    pub fn effective_config(&self) -> Option<&Document> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.config)
    }

    /// Fetch a snapshot and adopt it.
    pub async fn load(&mut self, provider: &dyn SnapshotProvider) {
        self.loading = true;
        self.last_error = None;
        match provider.read_snapshot().await {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => self.last_error = Some(err.to_string()),
        }
        self.loading = false;
    }

    /// Adopt `snapshot` as the cached base.
    ///
    /// A dirty form is kept as is; only a clean session replaces `form`,
    /// `form_original` and `raw_original`.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let raw_from_snapshot = match &snapshot.raw {
            Some(raw) => raw.clone(),
            None => serialize_form(&snapshot.parsed).unwrap_or_else(|_| self.raw.clone()),
        };

        self.raw = match (&self.form, self.form_dirty, self.form_mode) {
            (Some(form), true, FormMode::Form) => {
                serialize_form(form).unwrap_or_else(|_| raw_from_snapshot.clone())
            }
            _ => raw_from_snapshot.clone(),
        };
        self.valid = Some(snapshot.valid);
        self.issues = snapshot.issues.clone();

        if !self.form_dirty {
            self.form = Some(snapshot.parsed.clone());
            self.form_original = Some(snapshot.parsed.clone());
            self.raw_original = raw_from_snapshot;
        }
        self.snapshot = Some(snapshot);
    }

    /// Re-read the persisted document and reconcile it with local edits.
    ///
    /// - clean session: adopt the new snapshot
    /// - dirty, no rebase requested (or raw mode): refresh `valid` and
    ///   `issues` only; the old snapshot and its fingerprint stay cached so a
    ///   later save still detects the concurrent change
    /// - dirty form with `rebase_dirty_form`: replay local edits onto the
    ///   fresh as-written tree and adopt the fresh snapshot as the new base
    pub async fn refresh_snapshot_hash(
        &mut self,
        provider: &dyn SnapshotProvider,
        options: RefreshOptions,
    ) {
        let snapshot = match provider.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return;
            }
        };

        let rebase_dirty =
            self.form_dirty && self.form_mode == FormMode::Form && options.rebase_dirty_form;

        if self.form_dirty && !rebase_dirty {
            self.valid = Some(snapshot.valid);
            self.issues = snapshot.issues;
            return;
        }

        if !rebase_dirty {
            self.apply_snapshot(snapshot);
            return;
        }

        let latest = if snapshot.parsed.is_object() {
            snapshot.parsed.clone()
        } else {
            Document::object()
        };
        let original = self
            .form_original
            .clone()
            .or_else(|| {
                self.snapshot
                    .as_ref()
                    .map(|cached| cached.parsed.clone())
                    .filter(Document::is_object)
            })
            .unwrap_or_else(Document::object);
        let current = self.form.clone().unwrap_or_else(Document::object);

        let rebased = rebase_form_edits(&original, &current, &latest);
        tracing::debug!(
            base_hash = ?self.base_hash().map(|h| h.short().to_string()),
            latest_hash = ?fingerprint(&snapshot).map(|h| h.short().to_string()),
            "rebased dirty form onto fresh snapshot"
        );

        match serialize_form(&rebased) {
            Ok(raw) => self.raw = raw,
            Err(err) => self.last_error = Some(err.to_string()),
        }
        self.raw_original = match &snapshot.raw {
            Some(raw) => raw.clone(),
            None => serialize_form(&latest).unwrap_or_default(),
        };
        self.form = Some(rebased);
        self.form_original = Some(latest);
        self.valid = Some(snapshot.valid);
        self.issues = snapshot.issues.clone();
        self.snapshot = Some(snapshot);
    }

    fn editable_form(&self) -> Document {
        self.form
            .clone()
            .or_else(|| self.snapshot.as_ref().map(|s| s.parsed.clone()))
            .unwrap_or_else(Document::object)
    }

    fn commit_form_edit(&mut self, form: Document) {
        if self.form_mode == FormMode::Form {
            match serialize_form(&form) {
                Ok(raw) => self.raw = raw,
                Err(err) => self.last_error = Some(err.to_string()),
            }
        }
        self.form = Some(form);
        self.form_dirty = true;
    }

    /// Set a value in the form and mark the session dirty.
    pub fn update_value(&mut self, path: &DocPath, value: Document) {
        let mut form = self.editable_form();
        set_path(&mut form, path, value);
        self.commit_form_edit(form);
    }

    /// Remove a value from the form and mark the session dirty.
    pub fn remove_value(&mut self, path: &DocPath) {
        let mut form = self.editable_form();
        remove_path(&mut form, path);
        self.commit_form_edit(form);
    }

    /// Replace the raw text (raw-mode editing).
    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
        self.form_dirty = true;
    }

    pub fn set_mode(&mut self, mode: FormMode) {
        self.form_mode = mode;
    }

    /// Persist the session's content with the cached fingerprint as CAS
    /// token, then reload.
    pub async fn save(&mut self, provider: &dyn SnapshotProvider, writer: &dyn DocumentWriter) {
        self.saving = true;
        self.last_error = None;
        if let Err(err) = self.try_save(writer).await {
            self.last_error = Some(match err.kind() {
                ExErrorKind::HashUnavailable => err.message().to_string(),
                _ => err.to_string(),
            });
            self.saving = false;
            return;
        }
        self.form_dirty = false;
        self.load(provider).await;
        self.saving = false;
    }

    async fn try_save(&self, writer: &dyn DocumentWriter) -> Result<(), ExError> {
        let raw = match (&self.form, self.form_mode) {
            (Some(form), FormMode::Form) => serialize_form(form)?,
            _ => self.raw.clone(),
        };
        let Some(base_hash) = self.base_hash() else {
            return Err(ExError::new(ExErrorKind::HashUnavailable)
                .with_op("save_config")
                .with_message(HASH_MISSING_MESSAGE));
        };
        writer
            .write_raw(&raw, Some(&base_hash))
            .await
            .map_err(|err| err.with_op("save_config"))
    }
}
