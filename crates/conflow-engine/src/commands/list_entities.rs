//! Read-only listing of managed entities.

use conflow_core::entities::{default_entity_id, list_entity_entries, EntityEntry};
use conflow_core::errors::{ExError, ExErrorKind, Result};
use serde::{Deserialize, Serialize};

use crate::context::EngineContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityListing {
    pub default_id: String,
    pub entries: Vec<EntityEntry>,
}

/// List entities from the effective configuration.
///
/// Does not go through the mutation queue.
///
/// # Errors
///
/// `ConfigInvalid` when the persisted document is invalid; collaborator
/// read failures as reported by the provider.
pub async fn list_entities(engine: &EngineContext) -> Result<EntityListing> {
    let snapshot = engine.provider.read_snapshot().await?;
    if !snapshot.valid {
        return Err(ExError::new(ExErrorKind::ConfigInvalid)
            .with_op("list_entities")
            .with_message(format!("invalid config at {}", snapshot.path)));
    }
    Ok(EntityListing {
        default_id: default_entity_id(&snapshot.config),
        entries: list_entity_entries(&snapshot.config),
    })
}
