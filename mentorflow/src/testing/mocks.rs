//! Scripted stages for testing graphs and runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::context::StageContext;
use crate::core::{ConversationState, Message, PartialState};
use crate::errors::MentorflowError;
use crate::stages::Stage;

/// Appends one system message holding its own name.
#[derive(Debug, Clone)]
pub struct AppendStage {
    name: String,
}

impl AppendStage {
    /// Creates a new append stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for AppendStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        _state: &ConversationState,
        _ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        Ok(PartialState::single(Message::system(&self.name)))
    }
}

/// Records the conversation length it saw on each call.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    seen: Mutex<Vec<usize>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Returns the conversation length observed on each call.
    #[must_use]
    pub fn seen_lengths(&self) -> Vec<usize> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        state: &ConversationState,
        _ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        self.seen.lock().push(state.len());
        Ok(PartialState::empty())
    }
}

/// A stage that always fails.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: String,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        _state: &ConversationState,
        _ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        Err(MentorflowError::stage(&self.name, &self.error))
    }
}

/// A stage that sleeps before contributing nothing.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
}

impl SlowStage {
    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self {
            name: name.into(),
            delay: Duration::from_millis(ms),
        }
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        _state: &ConversationState,
        _ctx: &StageContext,
    ) -> Result<PartialState, MentorflowError> {
        tokio::time::sleep(self.delay).await;
        Ok(PartialState::empty())
    }
}
