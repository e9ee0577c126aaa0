//! Structured pipeline events.
//!
//! The runner and the stage context report what happens during a run through
//! an [`EventSink`] injected by the host: stage transitions, knowledge updates
//! and the run outcome.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the pipeline.
pub mod types {
    /// A run passed validation and is about to invoke its first stage.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A run finished every stage.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A run stopped on an error.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// A run stopped because its token was cancelled.
    pub const PIPELINE_CANCELLED: &str = "pipeline.cancelled";
    /// A stage is about to be invoked.
    pub const STAGE_STARTED: &str = "stage.started";
    /// A stage returned a partial state.
    pub const STAGE_COMPLETED: &str = "stage.completed";
    /// A stage returned an error.
    pub const STAGE_FAILED: &str = "stage.failed";
    /// A stage wrote to the knowledge store.
    pub const KNOWLEDGE_UPDATED: &str = "knowledge.updated";
}
