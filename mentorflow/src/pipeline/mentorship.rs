//! The mentorship workflow: mentor guidance, framework detection, code reply.

use super::{CompiledPipeline, PipelineGraph, PipelineRunner};
use crate::cancellation::CancellationToken;
use crate::completion::TextCompletion;
use crate::context::RunConfig;
use crate::core::{ConversationState, Message};
use crate::errors::{MentorflowError, PipelineValidationError};
use crate::events::EventSink;
use crate::knowledge::KnowledgeStore;
use crate::stages::{KnowledgeCheckStage, MentorStage, ResponseGenerationStage, Stage};
use std::sync::Arc;

/// Name of the compiled mentorship pipeline.
pub const MENTORSHIP_PIPELINE: &str = "mentorship";

/// Builds `Start -> mentor -> knowledge_check -> response -> End`.
///
/// # Errors
///
/// Returns an error only if the graph fails to compile.
pub fn mentorship_pipeline(
    completion: Arc<dyn TextCompletion>,
) -> Result<CompiledPipeline, PipelineValidationError> {
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(MentorStage::new()),
        Arc::new(KnowledgeCheckStage::new()),
        Arc::new(ResponseGenerationStage::new(completion)),
    ];
    PipelineGraph::linear(MENTORSHIP_PIPELINE, stages)?.compile()
}

/// The compiled mentorship pipeline bound to a runner.
///
/// One workflow serves any number of concurrent runs. Runs share the
/// knowledge store and nothing else.
#[derive(Debug, Clone)]
pub struct MentorshipWorkflow {
    runner: PipelineRunner,
    pipeline: Arc<CompiledPipeline>,
}

impl MentorshipWorkflow {
    /// Compiles the workflow around `completion`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph fails to compile.
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        completion: Arc<dyn TextCompletion>,
    ) -> Result<Self, PipelineValidationError> {
        Ok(Self {
            runner: PipelineRunner::new(knowledge),
            pipeline: Arc::new(mentorship_pipeline(completion)?),
        })
    }

    /// Sets the event sink used by every run.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.runner = self.runner.with_event_sink(sink);
        self
    }

    /// Returns the shared knowledge store.
    #[must_use]
    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        self.runner.knowledge()
    }

    /// Returns the compiled pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &CompiledPipeline {
        &self.pipeline
    }

    /// Runs the workflow for one thread.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty thread id, or the first
    /// stage failure.
    pub async fn run(
        &self,
        thread_id: &str,
        messages: Vec<Message>,
        mentor_enabled: bool,
    ) -> Result<ConversationState, MentorflowError> {
        self.runner
            .run(
                &self.pipeline,
                ConversationState::new(messages),
                RunConfig::for_thread(thread_id, mentor_enabled),
            )
            .await
    }

    /// Runs the workflow, aborting when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`MentorshipWorkflow::run`], plus [`MentorflowError::Cancelled`].
    pub async fn run_with_cancellation(
        &self,
        thread_id: &str,
        messages: Vec<Message>,
        mentor_enabled: bool,
        token: Arc<CancellationToken>,
    ) -> Result<ConversationState, MentorflowError> {
        self.runner
            .run_with_cancellation(
                &self.pipeline,
                ConversationState::new(messages),
                RunConfig::for_thread(thread_id, mentor_enabled),
                token,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::StaticCompletion;

    #[test]
    fn test_pipeline_shape() {
        let pipeline = mentorship_pipeline(Arc::new(StaticCompletion::new("ok"))).unwrap();
        assert_eq!(pipeline.name(), MENTORSHIP_PIPELINE);
        assert_eq!(
            pipeline.execution_order(),
            vec!["mentor", "knowledge_check", "response"]
        );
    }

    #[test]
    fn test_workflow_exposes_store() {
        let knowledge = Arc::new(KnowledgeStore::new());
        let workflow =
            MentorshipWorkflow::new(Arc::clone(&knowledge), Arc::new(StaticCompletion::new("ok")))
                .unwrap();
        assert!(Arc::ptr_eq(workflow.knowledge(), &knowledge));
        assert_eq!(workflow.pipeline().stage_count(), 3);
    }
}
