//! # Mentorflow
//!
//! A small stage-graph engine running a mentor-mode A/B experiment over a
//! conversation.
//!
//! Mentorflow provides:
//!
//! - **Stage graphs**: declare stages and edges, validated before any run
//! - **Append-only state**: every stage's messages are merged in order
//! - **Shared knowledge**: a concurrent key/value store visible to all runs
//! - **Mentor mode**: a per-run toggle selecting the mentor arm of the test
//! - **Cancellation and events**: cooperative cancellation and structured events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mentorflow::prelude::*;
//!
//! let workflow = MentorshipWorkflow::new(
//!     Arc::new(KnowledgeStore::new()),
//!     Arc::new(StaticCompletion::new("function App() {}")),
//! )?;
//!
//! let state = workflow
//!     .run("thread-1", vec![Message::user("Tell me about React")], true)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod api;
pub mod cancellation;
pub mod completion;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod knowledge;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api::{AbTestRequest, AbTestResponse, AbTestService, ApiResponse, TranscriptEntry};
    pub use crate::cancellation::CancellationToken;
    #[cfg(feature = "openai")]
    pub use crate::completion::OpenAiCompletion;
    pub use crate::completion::{StaticCompletion, TextCompletion};
    pub use crate::config::{CompletionConfig, LoggingConfig, MentorflowConfig};
    pub use crate::context::{PipelineContext, RunConfig, RunIdentity, StageContext};
    pub use crate::core::{ConversationAggregator, ConversationState, Message, PartialState, Role};
    pub use crate::errors::{
        CompletionError, ContractErrorInfo, CycleDetectedError, MentorflowError,
        PipelineValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::knowledge::{keys, KnowledgeStore};
    pub use crate::pipeline::{
        mentorship_pipeline, CompiledPipeline, MentorshipWorkflow, NodeId, PipelineGraph,
        PipelineRunner, StageKey,
    };
    pub use crate::stages::{
        AgentEntity, AgentRole, FnStage, KnowledgeCheckStage, MentorStage, NoOpStage,
        ResponseGenerationStage, Stage,
    };
    pub use std::sync::Arc;
}
