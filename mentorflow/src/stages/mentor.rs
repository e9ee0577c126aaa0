//! The mentor stage: the "A" arm of the mentor-mode experiment.

use super::{AgentEntity, Stage};
use crate::context::StageContext;
use crate::core::{ConversationState, Message, PartialState};
use crate::errors::MentorflowError;
use crate::knowledge::keys;
use async_trait::async_trait;
use tracing::debug;

const MENTOR_TIP: &str = "Always test code thoroughly.";
const NO_TIPS: &str = "No mentor tips yet.";
const NO_PRIOR_MESSAGE: &str = "No prior user message";

/// Adds step-by-step mentorship guidance when mentor mode is on.
///
/// With mentor mode off the stage is a no-op and returns an empty partial.
#[derive(Debug, Clone)]
pub struct MentorStage {
    name: String,
}

impl MentorStage {
    /// Creates the stage under its default name.
    #[must_use]
    pub fn new() -> Self {
        Self::named("mentor")
    }

    /// Creates the stage under a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MentorStage {
    fn default() -> Self {
        Self::new()
    }
}

fn guidance_text(tips: &str, last_user_text: &str) -> String {
    format!(
        "Mentor: Provide guidance based on these tips: {tips}.\n\
         The user previously said: \"{last_user_text}\".\n\
         Please give them step-by-step mentorship."
    )
}

#[async_trait]
impl Stage for MentorStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        state: &ConversationState,
        ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        if !ctx.config().mentor_enabled() {
            debug!(stage = %self.name, "mentor mode off, skipping");
            return Ok(PartialState::empty());
        }

        let senior = AgentEntity::mentor(100, "SeniorDev", 20);
        senior.share_knowledge(ctx, keys::MENTOR_TIPS, MENTOR_TIP);

        let tips = ctx
            .knowledge()
            .get_str(keys::MENTOR_TIPS)
            .unwrap_or_else(|| NO_TIPS.to_string());
        let last = state.last_text_or(NO_PRIOR_MESSAGE);

        Ok(PartialState::single(Message::system(guidance_text(&tips, last))))
    }
}
