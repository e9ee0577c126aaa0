//! Per-run context handed to stages.
//!
//! This module provides:
//! - The immutable run configuration (thread id, mentor toggle, tags)
//! - A run identity for correlating events
//! - Pipeline and stage contexts wiring in the shared knowledge store,
//!   the event sink and the cancellation token

mod execution;
mod identity;
mod run_config;

pub use execution::{PipelineContext, StageContext};
pub use identity::RunIdentity;
pub use run_config::RunConfig;
