//! The text-completion collaborator used by the response stage.
//!
//! The pipeline only depends on the [`TextCompletion`] trait. Failures are
//! surfaced as-is; nothing here retries.

#[cfg(feature = "openai")]
mod openai;
mod static_reply;

#[cfg(feature = "openai")]
pub use openai::OpenAiCompletion;
pub use static_reply::StaticCompletion;

use crate::core::Message;
use crate::errors::CompletionError;
use async_trait::async_trait;

/// Turns a conversation into one reply message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Generates a reply for `messages`.
    async fn generate(&self, messages: &[Message]) -> Result<Message, CompletionError>;
}
