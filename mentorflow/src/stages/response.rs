//! Final stage: ask the completion backend for an answer.

use super::{Stage, DEFAULT_FRAMEWORK};
use crate::completion::TextCompletion;
use crate::context::StageContext;
use crate::core::{ConversationState, Message, PartialState, Role};
use crate::errors::MentorflowError;
use crate::knowledge::keys;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds a code-generation instruction from the stored classification and
/// forwards the whole conversation plus that instruction to the backend.
///
/// The instruction is sent to the backend only; the stage's partial holds just
/// the reply.
pub struct ResponseGenerationStage {
    name: String,
    completion: Arc<dyn TextCompletion>,
}

impl ResponseGenerationStage {
    /// Creates the stage under its default name.
    #[must_use]
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self::named("response", completion)
    }

    /// Creates the stage under a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>, completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            name: name.into(),
            completion,
        }
    }
}

impl std::fmt::Debug for ResponseGenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseGenerationStage")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn instruction(framework: &str) -> Message {
    Message::user(format!(
        "Task: Please generate a code snippet in {framework} that addresses the user's last request."
    ))
}

#[async_trait]
impl Stage for ResponseGenerationStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        state: &ConversationState,
        ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        let framework = ctx
            .knowledge()
            .get_str(keys::FRAMEWORK)
            .unwrap_or_else(|| DEFAULT_FRAMEWORK.to_string());

        let mut prompt = state.messages().to_vec();
        prompt.push(instruction(&framework));
        debug!(stage = %self.name, prompt_len = prompt.len(), framework = %framework, "requesting completion");

        let reply = self.completion.generate(&prompt).await?;
        if reply.role() != Role::Assistant {
            warn!(stage = %self.name, role = %reply.role(), "backend reply re-tagged as assistant");
        }

        Ok(PartialState::single(Message::assistant(reply.text())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{MockTextCompletion, StaticCompletion};
    use crate::errors::CompletionError;
    use crate::testing::stage_context;

    #[tokio::test]
    async fn test_prompt_includes_instruction() {
        let backend = Arc::new(StaticCompletion::new("const App = () => null;"));
        let stage = ResponseGenerationStage::new(backend.clone());
        let (ctx, store) = stage_context("response", false);
        store.update(keys::FRAMEWORK, "React");
        let state = ConversationState::new(vec![Message::user("Tell me about React")]);

        let partial = stage.invoke(&state, &ctx).await.unwrap();

        assert_eq!(partial.messages, vec![Message::assistant("const App = () => null;")]);
        let prompt = &backend.prompts()[0];
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].text(), "Tell me about React");
        assert!(prompt[1].text().contains("code snippet in React"));
    }

    #[tokio::test]
    async fn test_missing_classification_uses_default() {
        let backend = Arc::new(StaticCompletion::new("ok"));
        let stage = ResponseGenerationStage::new(backend.clone());
        let (ctx, _) = stage_context("response", false);

        stage.invoke(&ConversationState::default(), &ctx).await.unwrap();

        let prompt = &backend.prompts()[0];
        assert_eq!(prompt.len(), 1);
        assert!(prompt[0].text().contains(DEFAULT_FRAMEWORK));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mut backend = MockTextCompletion::new();
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Err(CompletionError::Transport("connection reset".into())));
        let stage = ResponseGenerationStage::new(Arc::new(backend));
        let (ctx, _) = stage_context("response", false);

        let err = stage
            .invoke(&ConversationState::default(), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, MentorflowError::ExternalService(CompletionError::Transport(_))));
    }

    #[tokio::test]
    async fn test_reply_is_tagged_assistant() {
        let mut backend = MockTextCompletion::new();
        backend
            .expect_generate()
            .returning(|_| Ok(Message::user("odd backend")));
        let stage = ResponseGenerationStage::new(Arc::new(backend));
        let (ctx, _) = stage_context("response", false);

        let partial = stage.invoke(&ConversationState::default(), &ctx).await.unwrap();

        assert_eq!(partial.messages[0].role(), Role::Assistant);
        assert_eq!(partial.messages[0].text(), "odd backend");
    }
}
