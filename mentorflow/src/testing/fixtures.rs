//! Fixtures for invoking stages outside a full run.

use std::sync::Arc;

use crate::context::{PipelineContext, RunConfig, StageContext};
use crate::core::{ConversationState, Message};
use crate::knowledge::KnowledgeStore;

/// Builds a stage context on a fresh, isolated knowledge store.
///
/// Returns the store as well so tests can inspect what the stage wrote.
#[must_use]
pub fn stage_context(stage_name: &str, mentor_enabled: bool) -> (StageContext, Arc<KnowledgeStore>) {
    let knowledge = Arc::new(KnowledgeStore::new());
    let config = RunConfig::for_thread("test-thread", mentor_enabled);
    let pipeline_ctx = Arc::new(PipelineContext::new(config, Arc::clone(&knowledge)));
    (StageContext::new(pipeline_ctx, stage_name), knowledge)
}

/// A conversation holding one user message per text.
#[must_use]
pub fn user_state(texts: &[&str]) -> ConversationState {
    ConversationState::new(texts.iter().map(|t| Message::user(*t)).collect())
}
