#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{list_ids, memory_engine, FixedProvider, RecordingProvisioner, ScriptedProvider};
use conflow_core::errors::ExErrorKind;
use conflow_core::snapshot::Snapshot;
use conflow_core::{Document, DocumentWriter};
use conflow_core_types::{RequestContext, RequestId};
use conflow_engine::{create_entity, CreateEntityRequest, EngineContext};
use conflow_store::{FsDocumentStore, FsWorkspaceProvisioner, MemoryDocumentStore, PlaceholderEnv};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::Notify;

fn pretty(value: serde_json::Value) -> String {
    Document::from(value).to_pretty_string().unwrap()
}

#[tokio::test]
async fn test_create_in_missing_document() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, root) = memory_engine(store.clone());

    let result = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap();

    assert_eq!(result.id, "alpha");
    assert_eq!(result.workspace_path, root.path().join("workspace-alpha"));
    assert!(result.workspace_path.is_dir());
    assert_eq!(
        store.document(),
        Some(Document::from(json!({"agents": {"list": [{"id": "alpha"}]}})))
    );
}

#[tokio::test]
async fn test_id_normalized_and_name_kept() {
    let store = Arc::new(MemoryDocumentStore::with_raw(pretty(json!({"gateway": {"port": 1}}))));
    let (engine, _root) = memory_engine(store.clone());

    let request = CreateEntityRequest::new("  Ops Bot ").with_name(" Operations ");
    let result = create_entity(request, &RequestContext::new(), &engine)
        .await
        .unwrap();

    assert_eq!(result.id, "ops-bot");
    assert_eq!(result.name.as_deref(), Some("Operations"));
    assert_eq!(
        store.document(),
        Some(Document::from(json!({
            "gateway": {"port": 1},
            "agents": {"list": [{"id": "ops-bot", "name": "Operations"}]}
        })))
    );
}

#[tokio::test]
async fn test_blank_name_is_omitted() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store.clone());

    create_entity(
        CreateEntityRequest::new("alpha").with_name("   "),
        &RequestContext::new(),
        &engine,
    )
    .await
    .unwrap();

    assert_eq!(
        store.document(),
        Some(Document::from(json!({"agents": {"list": [{"id": "alpha"}]}})))
    );
}

#[tokio::test]
async fn test_unusable_id_rejected_without_write() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store.clone());

    let err = create_entity(CreateEntityRequest::new(" !! "), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidRequest);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_concurrent_creates_both_land_in_submission_order() {
    let store = Arc::new(MemoryDocumentStore::with_raw(pretty(json!({"agents": {"list": []}}))));
    let gate = Arc::new(Notify::new());
    let provider = Arc::new(ScriptedProvider::new(store.clone()).with_gate(gate.clone()));
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        provider,
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );
    let ctx = RequestContext::new();

    let alpha = create_entity(CreateEntityRequest::new("alpha"), &ctx, &engine);
    let beta = create_entity(CreateEntityRequest::new("beta"), &ctx, &engine);
    let opener = async {
        // Hold alpha's first read until beta is waiting behind it.
        while engine.queue.pending() < 2 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();
    };

    let (alpha, beta, ()) = tokio::join!(alpha, beta, opener);
    assert_eq!(alpha.unwrap().id, "alpha");
    assert_eq!(beta.unwrap().id, "beta");
    assert_eq!(list_ids(&store.document().unwrap()), vec!["alpha", "beta"]);
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_spawned_creates_all_succeed() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store.clone());

    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| {
            let engine = engine.clone();
            tokio::spawn(async move {
                create_entity(CreateEntityRequest::new(id), &RequestContext::new(), &engine).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut ids = list_ids(&store.document().unwrap());
    ids.sort();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_sequential_duplicate_rejected() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store.clone());
    let ctx = RequestContext::new();

    create_entity(CreateEntityRequest::new("alpha"), &ctx, &engine)
        .await
        .unwrap();
    let err = create_entity(CreateEntityRequest::new("ALPHA"), &ctx, &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::DuplicateId);
    assert!(err.is_retryable());
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_racing_duplicates_exactly_one_wins() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store.clone());
    let ctx = RequestContext::new();

    let (first, second) = tokio::join!(
        create_entity(CreateEntityRequest::new("alpha"), &ctx, &engine),
        create_entity(CreateEntityRequest::new("alpha"), &ctx, &engine),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes.into_iter().find_map(|r| r.err()).unwrap();
    assert_eq!(err.kind(), ExErrorKind::DuplicateId);
    assert_eq!(list_ids(&store.document().unwrap()), vec!["alpha"]);
}

#[tokio::test]
async fn test_outside_writer_adding_same_id_is_duplicate() {
    let store = Arc::new(MemoryDocumentStore::with_raw(pretty(json!({}))));
    let external = pretty(json!({"agents": {"list": [{"id": "alpha", "name": "theirs"}]}}));
    let external_clone = external.clone();
    let provider = Arc::new(
        ScriptedProvider::new(store.clone())
            .after_read(1, move |store| {
                store.replace_raw(external_clone).unwrap();
            }),
    );
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        provider,
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::DuplicateId);
    assert_eq!(store.raw(), Some(external));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_outside_writer_other_change_is_conflict() {
    let store = Arc::new(MemoryDocumentStore::with_raw(pretty(json!({}))));
    let external = pretty(json!({"gateway": {"port": 9}}));
    let external_clone = external.clone();
    let provider = Arc::new(
        ScriptedProvider::new(store.clone())
            .after_read(1, move |store| {
                store.replace_raw(external_clone).unwrap();
            }),
    );
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        provider.clone(),
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConcurrentModification);
    assert_eq!(provider.reads(), 2);
    assert_eq!(store.raw(), Some(external));
}

#[tokio::test]
async fn test_document_created_between_reads_is_conflict() {
    let store = Arc::new(MemoryDocumentStore::new());
    let provider = Arc::new(
        ScriptedProvider::new(store.clone()).after_read(1, |store| {
            store.replace_raw("{}").unwrap();
        }),
    );
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        provider,
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConcurrentModification);
    assert_eq!(store.raw().as_deref(), Some("{}"));
}

#[tokio::test]
async fn test_hash_mismatch_at_write_is_conflict_and_store_unchanged() {
    let original = pretty(json!({"agents": {"list": [{"id": "main"}]}}));
    let store = Arc::new(MemoryDocumentStore::with_raw(original.clone()));
    let (engine, _root) = memory_engine(store.clone());
    store.reject_next_write();

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConcurrentModification);
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::BaseHashMismatch)
    );
    assert_eq!(store.raw(), Some(original));

    // The queue drained; the next request goes through.
    create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap();
    assert_eq!(list_ids(&store.document().unwrap()), vec!["main", "alpha"]);
}

#[tokio::test]
async fn test_invalid_document_rejected_before_side_effects() {
    let store = Arc::new(MemoryDocumentStore::with_raw("{\"agents\": "));
    let root = TempDir::new().unwrap();
    let provisioner = Arc::new(RecordingProvisioner::new(root.path()));
    let engine = EngineContext::new(store.clone(), provisioner.clone());

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConfigInvalid);
    assert!(provisioner.created().is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_existing_document_without_hash_is_unavailable() {
    let snapshot = Snapshot {
        exists: true,
        ..Snapshot::missing("remote://config")
    };
    let store = Arc::new(MemoryDocumentStore::new());
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        Arc::new(FixedProvider(snapshot)),
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::HashUnavailable);
    assert!(!err.is_retryable());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_non_mapping_document_is_invalid() {
    let snapshot = Snapshot {
        exists: true,
        raw: Some("[]".to_string()),
        parsed: Document::Array(Vec::new()),
        ..Snapshot::missing("remote://config")
    };
    let store = Arc::new(MemoryDocumentStore::new());
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        Arc::new(FixedProvider(snapshot)),
        store,
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ConfigInvalid);
}

#[tokio::test]
async fn test_id_in_effective_form_only_is_duplicate() {
    let snapshot = Snapshot {
        exists: true,
        raw: Some("{}".to_string()),
        parsed: Document::object(),
        config: Document::from(json!({"agents": {"list": [{"id": "alpha"}]}})),
        ..Snapshot::missing("remote://config")
    };
    let store = Arc::new(MemoryDocumentStore::new());
    let root = TempDir::new().unwrap();
    let engine = EngineContext::from_parts(
        Arc::new(FixedProvider(snapshot)),
        store,
        Arc::new(FsWorkspaceProvisioner::new(root.path())),
    );

    let err = create_entity(CreateEntityRequest::new("alpha"), &RequestContext::new(), &engine)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::DuplicateId);
}

#[tokio::test]
async fn test_placeholders_preserved_and_workspace_from_effective_form() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("conflow.json");
    let ws_root = dir.path().join("resolved");
    std::fs::write(
        &config_path,
        pretty(json!({
            "channels": {"telegram": {"botToken": "${BOT_TOKEN}"}},
            "agents": {"defaults": {"workspace": "${WS_ROOT}/main"}, "list": []}
        })),
    )
    .unwrap();

    let env = PlaceholderEnv::new()
        .with_var("BOT_TOKEN", "123:live")
        .with_var("WS_ROOT", ws_root.to_string_lossy());
    let engine = EngineContext::open_file(&config_path, dir.path().join("fallback"), env);

    let result = create_entity(CreateEntityRequest::new("main"), &RequestContext::new(), &engine)
        .await
        .unwrap();

    assert_eq!(result.workspace_path, ws_root.join("main"));
    assert!(result.workspace_path.is_dir());

    let on_disk = std::fs::read_to_string(&config_path).unwrap();
    assert!(on_disk.contains("${BOT_TOKEN}"));
    assert!(on_disk.contains("${WS_ROOT}/main"));
    assert!(!on_disk.contains("123:live"));
    assert_eq!(list_ids(&Document::parse(&on_disk).unwrap()), vec!["main"]);
}

#[tokio::test]
async fn test_errors_carry_request_id() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (engine, _root) = memory_engine(store);
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-42".to_string()));

    let err = create_entity(CreateEntityRequest::new(""), &ctx, &engine)
        .await
        .unwrap_err();

    assert_eq!(err.request_id().map(|r| r.as_str()), Some("req-42"));
    assert_eq!(err.entity_id(), Some(""));
}

#[tokio::test]
async fn test_fs_store_writer_accepts_engine_output() {
    // Second create against the same file sees the first one's hash.
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsDocumentStore::new(dir.path().join("c.json")));
    let engine = EngineContext::new(
        store.clone(),
        Arc::new(FsWorkspaceProvisioner::new(dir.path())),
    );
    let ctx = RequestContext::new();

    create_entity(CreateEntityRequest::new("a"), &ctx, &engine)
        .await
        .unwrap();
    create_entity(CreateEntityRequest::new("b"), &ctx, &engine)
        .await
        .unwrap();

    let err = store
        .write_document(&Document::object(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::BaseHashMismatch);
}
