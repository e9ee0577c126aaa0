//! A completion backend that always answers with the same text.

use super::TextCompletion;
use crate::core::Message;
use crate::errors::CompletionError;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Replies with a fixed text and remembers every prompt it was given.
///
/// Used by the demo binary when no API key is configured, and in tests.
#[derive(Debug)]
pub struct StaticCompletion {
    reply: String,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl StaticCompletion {
    /// Creates a backend replying with `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns every prompt received, oldest first.
    #[must_use]
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextCompletion for StaticCompletion {
    async fn generate(&self, messages: &[Message]) -> Result<Message, CompletionError> {
        self.prompts.lock().push(messages.to_vec());
        Ok(Message::assistant(&self.reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_reply_records_prompts() {
        let backend = StaticCompletion::new("fn main() {}");
        let reply = backend.generate(&[Message::user("write code")]).await.unwrap();

        assert_eq!(reply, Message::assistant("fn main() {}"));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.prompts()[0][0].text(), "write code");
    }
}
