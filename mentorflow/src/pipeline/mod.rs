//! Pipeline building and execution.
//!
//! This module provides:
//! - A declarative stage graph validated at compile time
//! - A sequential runner merging stage outputs into the conversation
//! - The mentorship workflow wired from the built-in stages

mod graph;
mod mentorship;
mod runner;

pub use graph::{CompiledPipeline, NodeId, PipelineGraph, StageKey};
pub use mentorship::{mentorship_pipeline, MentorshipWorkflow, MENTORSHIP_PIPELINE};
pub use runner::PipelineRunner;
