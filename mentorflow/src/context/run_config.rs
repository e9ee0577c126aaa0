//! Immutable per-run parameters.

use crate::errors::{ContractErrorInfo, PipelineValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Parameters of a single run, read-only for every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    thread_id: String,
    #[serde(default)]
    mentor_enabled: bool,
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl RunConfig {
    /// Creates a configuration with mentor mode off and no tags.
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            mentor_enabled: false,
            tags: BTreeSet::new(),
        }
    }

    /// Creates the configuration used for A/B runs: the mentor toggle plus a
    /// `thread:<id>` tag.
    #[must_use]
    pub fn for_thread(thread_id: impl Into<String>, mentor_enabled: bool) -> Self {
        let thread_id = thread_id.into();
        let tag = format!("thread:{thread_id}");
        Self::new(thread_id).with_mentor(mentor_enabled).with_tag(tag)
    }

    /// Sets mentor mode.
    #[must_use]
    pub fn with_mentor(mut self, enabled: bool) -> Self {
        self.mentor_enabled = enabled;
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns the thread id.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Returns whether mentor mode is on.
    #[must_use]
    pub fn mentor_enabled(&self) -> bool {
        self.mentor_enabled
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread id is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.thread_id.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Run configuration requires a non-empty thread id",
            )
            .with_error_info(
                ContractErrorInfo::new("RUN-EMPTY_THREAD_ID", "Thread id is empty")
                    .with_fix_hint("Pass the conversation's thread id when starting a run."),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_thread_adds_tag() {
        let config = RunConfig::for_thread("t-42", true);

        assert_eq!(config.thread_id(), "t-42");
        assert!(config.mentor_enabled());
        assert!(config.tags().contains("thread:t-42"));
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::new("t");
        assert!(!config.mentor_enabled());
        assert!(config.tags().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_thread_id_rejected() {
        for id in ["", "   "] {
            let err = RunConfig::new(id).validate().unwrap_err();
            assert_eq!(err.code(), Some("RUN-EMPTY_THREAD_ID"));
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{"thread_id": "abc"}"#).unwrap();
        assert_eq!(config, RunConfig::new("abc"));
    }
}
