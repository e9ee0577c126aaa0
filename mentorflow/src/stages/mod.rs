//! Stage trait and implementations.
//!
//! Stages are the units of work in a mentorflow pipeline. Each one reads the
//! conversation accumulated so far and returns a partial state to append.

mod agent;
mod knowledge_check;
mod mentor;
mod response;

pub use agent::{AgentEntity, AgentRole};
pub use knowledge_check::{classify_framework, KnowledgeCheckStage, DEFAULT_FRAMEWORK};
pub use mentor::MentorStage;
pub use response::ResponseGenerationStage;

use crate::context::StageContext;
use crate::core::{ConversationState, PartialState};
use crate::errors::MentorflowError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Runs the stage against the current conversation.
    ///
    /// # Arguments
    ///
    /// * `state` - The conversation merged from all earlier stages
    /// * `ctx` - Run configuration, shared knowledge and event emission
    ///
    /// # Errors
    ///
    /// Returns an error only for unexpected failures; the run stops on it.
    async fn invoke(
        &self,
        state: &ConversationState,
        ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError>;
}

/// A stage backed by a synchronous function.
pub struct FnStage<F>
where
    F: Fn(&ConversationState, &StageContext) -> Result<PartialState, MentorflowError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&ConversationState, &StageContext) -> Result<PartialState, MentorflowError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&ConversationState, &StageContext) -> Result<PartialState, MentorflowError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&ConversationState, &StageContext) -> Result<PartialState, MentorflowError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        state: &ConversationState,
        ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        (self.func)(state, ctx)
    }
}

/// A stage that contributes nothing.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        _state: &ConversationState,
        _ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        Ok(PartialState::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;
    use crate::testing::stage_context;

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("echo", |state: &ConversationState, _ctx: &StageContext| {
            Ok(PartialState::single(Message::system(format!(
                "saw {} messages",
                state.len()
            ))))
        });
        assert_eq!(stage.name(), "echo");

        let (ctx, _) = stage_context("echo", false);
        let state = ConversationState::new(vec![Message::user("hi")]);
        let partial = stage.invoke(&state, &ctx).await.unwrap();

        assert_eq!(partial.messages[0].text(), "saw 1 messages");
    }

    #[tokio::test]
    async fn test_noop_stage() {
        let stage = NoOpStage::new("noop");
        assert_eq!(stage.name(), "noop");

        let (ctx, _) = stage_context("noop", true);
        let partial = stage.invoke(&ConversationState::default(), &ctx).await.unwrap();
        assert!(partial.is_empty());
    }
}
