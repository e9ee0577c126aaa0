//! Pipeline and stage execution contexts.

use super::{RunConfig, RunIdentity};
use crate::cancellation::CancellationToken;
use crate::events::{types, EventSink, NoOpEventSink};
use crate::knowledge::KnowledgeStore;
use std::sync::Arc;

/// Everything a single run shares with its stages.
pub struct PipelineContext {
    identity: RunIdentity,
    config: RunConfig,
    knowledge: Arc<KnowledgeStore>,
    event_sink: Arc<dyn EventSink>,
    cancellation: Option<Arc<CancellationToken>>,
}

impl PipelineContext {
    /// Creates a context for a run using `config`.
    #[must_use]
    pub fn new(config: RunConfig, knowledge: Arc<KnowledgeStore>) -> Self {
        Self {
            identity: RunIdentity::new(config.thread_id()),
            config,
            knowledge,
            event_sink: Arc::new(NoOpEventSink),
            cancellation: None,
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Returns the shared knowledge store.
    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Returns the cancellation token, if the caller supplied one.
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_deref()
    }

    /// Checks if the caller cancelled the run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Emits an event enriched with the run's correlation fields, awaiting
    /// the sink.
    pub async fn emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.event_sink
            .emit(event_type, Some(self.enrich(data)))
            .await;
    }

    /// Emits an event enriched with the run's correlation fields.
    pub fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.event_sink.try_emit(event_type, Some(self.enrich(data)));
    }

    fn enrich(&self, data: Option<serde_json::Value>) -> serde_json::Value {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));

        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert(
                "run_id".to_string(),
                serde_json::json!(self.identity.run_id.to_string()),
            );
            map.insert(
                "thread_id".to_string(),
                serde_json::json!(&self.identity.thread_id),
            );
            map.insert(
                "mentor_enabled".to_string(),
                serde_json::json!(self.config.mentor_enabled()),
            );
        }

        enriched
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// The context for a single stage invocation.
#[derive(Debug, Clone)]
pub struct StageContext {
    pipeline_ctx: Arc<PipelineContext>,
    stage_name: String,
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(pipeline_ctx: Arc<PipelineContext>, stage_name: impl Into<String>) -> Self {
        Self {
            pipeline_ctx,
            stage_name: stage_name.into(),
        }
    }

    /// Returns the name of the stage being invoked.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        self.pipeline_ctx.config()
    }

    /// Returns the shared knowledge store.
    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeStore {
        self.pipeline_ctx.knowledge()
    }

    /// Returns the pipeline context.
    #[must_use]
    pub fn pipeline_ctx(&self) -> &Arc<PipelineContext> {
        &self.pipeline_ctx
    }

    /// Writes to the knowledge store and reports the write as an event.
    pub fn update_knowledge(&self, key: &str, value: impl Into<serde_json::Value>) {
        self.knowledge().update(key, value);
        self.try_emit_event(
            types::KNOWLEDGE_UPDATED,
            Some(serde_json::json!({ "key": key })),
        );
    }

    /// Checks if the caller cancelled the run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.pipeline_ctx.is_cancelled()
    }

    /// Emits an event tagged with this stage's name.
    pub fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));

        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert("stage".to_string(), serde_json::json!(&self.stage_name));
        }

        self.pipeline_ctx.try_emit_event(event_type, Some(enriched));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;

    #[test]
    fn test_update_knowledge_emits_event() {
        let sink = Arc::new(CollectingEventSink::new());
        let knowledge = Arc::new(KnowledgeStore::new());
        let pipeline_ctx = Arc::new(
            PipelineContext::new(RunConfig::new("t-1"), Arc::clone(&knowledge))
                .with_event_sink(sink.clone()),
        );
        let ctx = StageContext::new(pipeline_ctx, "knowledge_check");

        ctx.update_knowledge("framework", "React");

        assert_eq!(knowledge.get_str("framework").as_deref(), Some("React"));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        let (event_type, data) = &events[0];
        assert_eq!(event_type, types::KNOWLEDGE_UPDATED);
        let data = data.as_ref().unwrap();
        assert_eq!(data["key"], "framework");
        assert_eq!(data["stage"], "knowledge_check");
        assert_eq!(data["thread_id"], "t-1");
    }

    #[test]
    fn test_cancellation_visible_to_stage() {
        let token = Arc::new(CancellationToken::new());
        let pipeline_ctx = Arc::new(
            PipelineContext::new(RunConfig::new("t"), Arc::new(KnowledgeStore::new()))
                .with_cancellation(Arc::clone(&token)),
        );
        let ctx = StageContext::new(pipeline_ctx, "mentor");

        assert!(!ctx.is_cancelled());
        token.cancel("stop");
        assert!(ctx.is_cancelled());
    }
}
