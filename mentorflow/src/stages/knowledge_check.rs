//! Keyword classification of the latest message.

use super::Stage;
use crate::context::StageContext;
use crate::core::{ConversationState, Message, PartialState};
use crate::errors::MentorflowError;
use crate::knowledge::keys;
use async_trait::async_trait;
use tracing::debug;

/// Classification used when no keyword matches.
pub const DEFAULT_FRAMEWORK: &str = "Vanilla JS";

const NO_LAST_MESSAGE: &str = "No last message";

/// Keyword (lowercase) to canonical framework name. First match wins.
const VOCABULARY: &[(&str, &str)] = &[("react", "React"), ("node.js", "Node.js")];

/// Classifies `text` against the framework vocabulary.
///
/// Matching is a case-insensitive substring test, checked top to bottom;
/// the first hit wins and [`DEFAULT_FRAMEWORK`] is returned when none hit.
#[must_use]
pub fn classify_framework(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    VOCABULARY
        .iter()
        .find(|(keyword, _)| lowered.contains(*keyword))
        .map_or(DEFAULT_FRAMEWORK, |&(_, canonical)| canonical)
}

/// Records the detected framework in the knowledge store and announces it.
#[derive(Debug, Clone)]
pub struct KnowledgeCheckStage {
    name: String,
}

impl KnowledgeCheckStage {
    /// Creates the stage under its default name.
    #[must_use]
    pub fn new() -> Self {
        Self::named("knowledge_check")
    }

    /// Creates the stage under a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for KnowledgeCheckStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for KnowledgeCheckStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        state: &ConversationState,
        ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        debug!(stage = %self.name, messages = state.len(), "classifying last message");

        let framework = classify_framework(state.last_text_or(NO_LAST_MESSAGE));
        ctx.update_knowledge(keys::FRAMEWORK, framework);

        Ok(PartialState::single(Message::system(format!(
            "System: Oracle recognized the user might want to use {framework} for coding."
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stage_context;

    #[test]
    fn test_classify_vocabulary() {
        assert_eq!(classify_framework("Tell me about React"), "React");
        assert_eq!(classify_framework("REACT hooks"), "React");
        assert_eq!(classify_framework("a Node.js server"), "Node.js");
        assert_eq!(classify_framework("plain html"), DEFAULT_FRAMEWORK);
        assert_eq!(classify_framework(""), DEFAULT_FRAMEWORK);
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(classify_framework("node.js or react?"), "React");
    }

    #[tokio::test]
    async fn test_stage_writes_classification() {
        let stage = KnowledgeCheckStage::new();
        let (ctx, store) = stage_context("knowledge_check", false);
        store.update(keys::FRAMEWORK, "Node.js");
        let state = ConversationState::new(vec![Message::user("Tell me about React")]);

        let partial = stage.invoke(&state, &ctx).await.unwrap();

        assert_eq!(store.get_str(keys::FRAMEWORK).as_deref(), Some("React"));
        assert_eq!(partial.messages.len(), 1);
        assert_eq!(partial.messages[0].role(), crate::core::Role::System);
        assert_eq!(
            partial.messages[0].text(),
            "System: Oracle recognized the user might want to use React for coding."
        );
    }

    #[tokio::test]
    async fn test_empty_state_falls_back() {
        let stage = KnowledgeCheckStage::new();
        let (ctx, store) = stage_context("knowledge_check", false);

        let partial = stage.invoke(&ConversationState::default(), &ctx).await.unwrap();

        assert_eq!(store.get_str(keys::FRAMEWORK).as_deref(), Some(DEFAULT_FRAMEWORK));
        assert!(partial.messages[0].text().contains(DEFAULT_FRAMEWORK));
    }
}
