//! Sequential execution of a compiled pipeline.

use super::CompiledPipeline;
use crate::cancellation::CancellationToken;
use crate::context::{PipelineContext, RunConfig, StageContext};
use crate::core::{ConversationState, PartialState};
use crate::errors::MentorflowError;
use crate::events::{types, EventSink, NoOpEventSink};
use crate::knowledge::KnowledgeStore;
use crate::stages::Stage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs compiled pipelines against the shared knowledge store.
///
/// Stages run strictly one after another: each sees the merge of every
/// earlier stage's output. Many runs may share one runner concurrently; they
/// share only the knowledge store.
#[derive(Clone)]
pub struct PipelineRunner {
    knowledge: Arc<KnowledgeStore>,
    event_sink: Arc<dyn EventSink>,
}

impl PipelineRunner {
    /// Creates a runner over `knowledge`.
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self {
            knowledge,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the shared knowledge store.
    #[must_use]
    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    /// Runs `pipeline` to completion.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is malformed, or the first error
    /// any stage returns. No partial state is returned on failure.
    pub async fn run(
        &self,
        pipeline: &CompiledPipeline,
        initial: ConversationState,
        config: RunConfig,
    ) -> Result<ConversationState, MentorflowError> {
        self.execute(pipeline, initial, config, None).await
    }

    /// Runs `pipeline`, aborting as soon as `token` is cancelled.
    ///
    /// Cancellation interrupts an in-flight stage; later stages never run.
    ///
    /// # Errors
    ///
    /// As [`PipelineRunner::run`], plus [`MentorflowError::Cancelled`].
    pub async fn run_with_cancellation(
        &self,
        pipeline: &CompiledPipeline,
        initial: ConversationState,
        config: RunConfig,
        token: Arc<CancellationToken>,
    ) -> Result<ConversationState, MentorflowError> {
        self.execute(pipeline, initial, config, Some(token)).await
    }

    async fn execute(
        &self,
        pipeline: &CompiledPipeline,
        initial: ConversationState,
        config: RunConfig,
        token: Option<Arc<CancellationToken>>,
    ) -> Result<ConversationState, MentorflowError> {
        if let Err(err) = config.validate() {
            warn!(pipeline = %pipeline.name(), error = %err, "rejected run configuration");
            return Err(err.into());
        }

        let mut pipeline_ctx = PipelineContext::new(config, Arc::clone(&self.knowledge))
            .with_event_sink(Arc::clone(&self.event_sink));
        if let Some(token) = token {
            pipeline_ctx = pipeline_ctx.with_cancellation(token);
        }
        let ctx = Arc::new(pipeline_ctx);
        let start = Instant::now();

        info!(
            pipeline = %pipeline.name(),
            run_id = %ctx.identity().run_id,
            thread_id = %ctx.identity().thread_id,
            "pipeline run started"
        );
        ctx.emit_event(
            types::PIPELINE_STARTED,
            Some(serde_json::json!({
                "pipeline": pipeline.name(),
                "stages": pipeline.execution_order(),
                "initial_messages": initial.len(),
            })),
        )
        .await;

        let mut state = initial;
        for (key, stage) in pipeline.stages() {
            if let Some(token) = ctx.cancellation().filter(|t| t.is_cancelled()) {
                return Err(self.abort(&ctx, pipeline, cancelled(token)).await);
            }

            let stage_ctx = StageContext::new(Arc::clone(&ctx), key.as_str());
            stage_ctx.try_emit_event(types::STAGE_STARTED, None);
            let stage_start = Instant::now();

            match invoke_stage(stage.as_ref(), &state, &stage_ctx).await {
                Ok(partial) => {
                    let appended = partial.messages.len();
                    state.apply(partial);
                    debug!(stage = %key, appended, total = state.len(), "stage merged");
                    stage_ctx.try_emit_event(
                        types::STAGE_COMPLETED,
                        Some(serde_json::json!({
                            "appended": appended,
                            "duration_ms": stage_start.elapsed().as_secs_f64() * 1000.0,
                        })),
                    );
                }
                Err(err) => {
                    stage_ctx.try_emit_event(
                        types::STAGE_FAILED,
                        Some(serde_json::json!({
                            "kind": err.kind(),
                            "error": err.to_string(),
                            "duration_ms": stage_start.elapsed().as_secs_f64() * 1000.0,
                        })),
                    );
                    return Err(self.abort(&ctx, pipeline, err).await);
                }
            }
        }

        info!(
            pipeline = %pipeline.name(),
            run_id = %ctx.identity().run_id,
            messages = state.len(),
            "pipeline run completed"
        );
        ctx.emit_event(
            types::PIPELINE_COMPLETED,
            Some(serde_json::json!({
                "pipeline": pipeline.name(),
                "messages": state.len(),
                "duration_ms": start.elapsed().as_secs_f64() * 1000.0,
            })),
        )
        .await;

        Ok(state)
    }

    async fn abort(
        &self,
        ctx: &PipelineContext,
        pipeline: &CompiledPipeline,
        err: MentorflowError,
    ) -> MentorflowError {
        let event_type = if matches!(err, MentorflowError::Cancelled(_)) {
            types::PIPELINE_CANCELLED
        } else {
            types::PIPELINE_FAILED
        };
        warn!(
            pipeline = %pipeline.name(),
            run_id = %ctx.identity().run_id,
            error = %err,
            "pipeline run aborted"
        );
        ctx.emit_event(
            event_type,
            Some(serde_json::json!({
                "pipeline": pipeline.name(),
                "kind": err.kind(),
                "error": err.to_string(),
            })),
        )
        .await;
        err
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("knowledge_entries", &self.knowledge.len())
            .finish_non_exhaustive()
    }
}

fn cancelled(token: &CancellationToken) -> MentorflowError {
    MentorflowError::Cancelled(token.reason().unwrap_or_else(|| "cancelled".to_string()))
}

/// Invokes one stage, racing it against the run's cancellation token.
async fn invoke_stage(
    stage: &dyn Stage,
    state: &ConversationState,
    ctx: &StageContext,
) -> Result<PartialState, MentorflowError> {
    let Some(token) = ctx.pipeline_ctx().cancellation() else {
        return stage.invoke(state, ctx).await;
    };

    tokio::select! {
        biased;
        () = token.cancelled() => Err(cancelled(token)),
        result = stage.invoke(state, ctx) => result,
    }
}
