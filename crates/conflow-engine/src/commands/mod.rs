//! Command orchestration layer.
//!
//! ## Logging Ownership
//!
//! Commands own lifecycle logging: `log_op_start!` at entry, `log_op_end!`
//! on success, `log_op_error!` on failure. Lower layers use only
//! `tracing::debug!()` for internal details.

pub mod create_entity;
pub mod list_entities;
