//! Testing utilities for mentorflow pipelines.
//!
//! This module provides:
//! - Context fixtures for invoking a stage in isolation
//! - Scripted stages for exercising the graph and runner
//! - Transcript assertions

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_roles, assert_text_contains};
pub use fixtures::{stage_context, user_state};
pub use mocks::{AppendStage, FailingStage, RecordingStage, SlowStage};
