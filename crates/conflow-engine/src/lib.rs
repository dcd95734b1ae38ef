//! Conflow Engine - Orchestration layer
//!
//! Coordinates the pure merge kernel in `conflow-core` with the storage
//! collaborators: a FIFO mutation queue and the entity-creation command.

pub mod commands;
pub mod context;
pub mod queue;

pub use commands::create_entity::{create_entity, CreateEntityRequest, CreateEntityResult};
pub use commands::list_entities::{list_entities, EntityListing};
pub use context::EngineContext;
pub use queue::MutationQueue;
