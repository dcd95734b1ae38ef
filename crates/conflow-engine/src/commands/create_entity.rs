//! Entity creation under the mutation queue.
//!
//! ## Pipeline (in order, inside the queue):
//! 1. Read snapshot S0; reject an invalid document
//! 2. Derive the base fingerprint; an existing document must have one
//! 3. Reject ids already present in the effective or as-written tree
//! 4. Append `{id, name?}` to `agents.list` of the as-written tree
//! 5. Resolve and create the workspace directory from the effective tree
//! 6. Re-read snapshot S1 and reject if the document moved
//! 7. CAS write against the S0 fingerprint
//!
//! The as-written tree is the one persisted, so `${VAR}` placeholders in
//! the document survive the write. Nothing is retried; conflicts are
//! reported to the caller.

use std::path::PathBuf;

use conflow_core::entities::{
    add_entity_entry, known_entity_ids, normalize_display_name, normalize_entity_id,
};
use conflow_core::errors::{ExError, ExErrorKind, Result};
use conflow_core::snapshot::{fingerprint, Snapshot};
use conflow_core::{log_op_end, log_op_error, log_op_start};
use conflow_core_types::RequestContext;
use serde::{Deserialize, Serialize};

use crate::context::EngineContext;

const OP: &str = "create_entity";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntityRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CreateEntityRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntityResult {
    /// Normalized id as persisted
    pub id: String,
    pub name: Option<String>,
    pub workspace_path: PathBuf,
}

/// Create a managed entity and persist it to the configuration document.
///
/// # Errors
///
/// - `InvalidRequest`: the id normalizes to nothing
/// - `ConfigInvalid`: the persisted document is invalid or not a mapping
/// - `DuplicateId`: the id is already taken
/// - `HashUnavailable`: the document exists but has no fingerprint
/// - `ConcurrentModification`: another writer moved the document
/// - `Io` / `Persistence`: collaborator failures
pub async fn create_entity(
    request: CreateEntityRequest,
    ctx: &RequestContext,
    engine: &EngineContext,
) -> Result<CreateEntityResult> {
    log_op_start!(
        OP,
        entity_id = request.id.as_str(),
        request_id = ctx.request_id.as_str()
    );
    let start = std::time::Instant::now();

    let result = create_entity_impl(&request, engine)
        .await
        .map_err(|e| attach_context(e, ctx, &request.id))
        .map_err(|e| {
            log_op_error!(
                OP,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                entity_id = request.id.as_str(),
                request_id = ctx.request_id.as_str()
            );
            e
        })?;

    log_op_end!(
        OP,
        duration_ms = start.elapsed().as_millis() as u64,
        entity_id = result.id.as_str(),
        workspace = %result.workspace_path.display(),
        request_id = ctx.request_id.as_str()
    );

    Ok(result)
}

fn attach_context(err: ExError, ctx: &RequestContext, raw_id: &str) -> ExError {
    let mut err = err.with_request_id(ctx.request_id.clone());
    if let Some(trace_id) = &ctx.trace_id {
        err = err.with_trace_id(trace_id.clone());
    }
    if err.entity_id().is_none() {
        err = err.with_entity_id(raw_id);
    }
    if err.op().is_none() {
        err = err.with_op(OP);
    }
    err
}

async fn create_entity_impl(
    request: &CreateEntityRequest,
    engine: &EngineContext,
) -> Result<CreateEntityResult> {
    let id = normalize_entity_id(&request.id)?;
    let name = normalize_display_name(request.name.as_deref());

    engine
        .queue
        .run(create_entity_locked(id, name, engine))
        .await
}

fn config_invalid(snapshot: &Snapshot) -> ExError {
    let detail = snapshot
        .issues
        .first()
        .map(|issue| format!(": {}: {}", issue.path, issue.message))
        .unwrap_or_default();
    ExError::new(ExErrorKind::ConfigInvalid)
        .with_op(OP)
        .with_message(format!("invalid config at {}{}", snapshot.path, detail))
}

fn hash_unavailable() -> ExError {
    ExError::new(ExErrorKind::HashUnavailable)
        .with_op(OP)
        .with_message("config hash unavailable; reload and retry")
}

fn concurrent_modification() -> ExError {
    ExError::new(ExErrorKind::ConcurrentModification)
        .with_op(OP)
        .with_message("config changed while creating agent; reload and retry")
}

fn duplicate_id(id: &str) -> ExError {
    ExError::new(ExErrorKind::DuplicateId)
        .with_op(OP)
        .with_entity_id(id)
        .with_message(format!("agent \"{}\" already exists", id))
}

async fn create_entity_locked(
    id: String,
    name: Option<String>,
    engine: &EngineContext,
) -> Result<CreateEntityResult> {
    let s0 = engine.provider.read_snapshot().await?;
    if !s0.valid {
        return Err(config_invalid(&s0));
    }
    let hash0 = fingerprint(&s0);
    if s0.exists && hash0.is_none() {
        return Err(hash_unavailable());
    }
    if !s0.parsed.is_object() {
        return Err(ExError::new(ExErrorKind::ConfigInvalid)
            .with_op(OP)
            .with_message("config root must be an object"));
    }
    if known_entity_ids(&s0.config, &s0.parsed).contains(&id) {
        return Err(duplicate_id(&id));
    }

    let next = add_entity_entry(&s0.parsed, &id, name.as_deref());

    let effective = add_entity_entry(&s0.config, &id, name.as_deref());
    let workspace_path = engine.provisioner.resolve_workspace_path(&effective, &id);
    engine.provisioner.ensure_directory(&workspace_path).await?;

    let s1 = engine.provider.read_snapshot().await?;
    if !s1.valid {
        return Err(config_invalid(&s1));
    }
    let hash1 = fingerprint(&s1);
    if s0.exists && hash1.is_none() {
        return Err(hash_unavailable());
    }
    if s0.exists != s1.exists {
        return Err(concurrent_modification());
    }
    if hash0 != hash1 {
        tracing::debug!(
            base_hash = ?hash0.as_ref().map(|h| h.short().to_string()),
            latest_hash = ?hash1.as_ref().map(|h| h.short().to_string()),
            "config moved during create"
        );
        if known_entity_ids(&s1.config, &s1.parsed).contains(&id) {
            return Err(duplicate_id(&id));
        }
        return Err(concurrent_modification());
    }

    engine
        .writer
        .write_document(&next, hash0.as_ref())
        .await
        .map_err(|err| match err.kind() {
            ExErrorKind::BaseHashMismatch => concurrent_modification().with_source(err),
            _ => ExError::new(ExErrorKind::Persistence)
                .with_op(OP)
                .with_message(format!("failed to write config: {}", err.message()))
                .with_source(err),
        })?;

    Ok(CreateEntityResult {
        id,
        name,
        workspace_path,
    })
}
