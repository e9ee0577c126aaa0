//! Conversation state and the aggregation rule that grows it.

use super::Message;
use serde::{Deserialize, Serialize};

/// The running conversation of one pipeline run.
///
/// Append-only: the only mutation is [`ConversationState::apply`], which
/// appends a stage's partial output after everything already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Creates a state seeded with the caller's messages.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Returns the messages in creation order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the last message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the last message's text, or `sentinel` when the state is empty.
    #[must_use]
    pub fn last_text_or<'a>(&'a self, sentinel: &'a str) -> &'a str {
        self.last().map_or(sentinel, Message::text)
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Merges a partial update into this state.
    pub fn apply(&mut self, partial: PartialState) {
        let existing = std::mem::take(&mut self.messages);
        self.messages = ConversationAggregator::merge(existing, partial.messages);
    }

    /// Consumes the state, returning its messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// A stage's contribution to the conversation, before merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialState {
    /// Messages to append, in order. May be empty.
    pub messages: Vec<Message>,
}

impl PartialState {
    /// A partial that contributes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A partial holding exactly one message.
    #[must_use]
    pub fn single(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    /// Returns true if nothing would be appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The merge rule for the `messages` channel.
///
/// Plain concatenation: associative, order-preserving, with the empty
/// sequence as identity. No deduplication.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationAggregator;

impl ConversationAggregator {
    /// Appends `incoming` after `existing`.
    #[must_use]
    pub fn merge(mut existing: Vec<Message>, incoming: Vec<Message>) -> Vec<Message> {
        existing.extend(incoming);
        existing
    }

    /// The channel's starting value.
    #[must_use]
    pub fn default_value() -> Vec<Message> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msgs(texts: &[&str]) -> Vec<Message> {
        texts.iter().map(|t| Message::user(*t)).collect()
    }

    #[test]
    fn test_merge_appends_in_order() {
        let merged = ConversationAggregator::merge(msgs(&["a", "b"]), msgs(&["c"]));
        assert_eq!(merged, msgs(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_is_associative() {
        let (a, b, c) = (msgs(&["a1", "a2"]), msgs(&["b1"]), msgs(&["c1", "c2"]));

        let left = ConversationAggregator::merge(
            ConversationAggregator::merge(a.clone(), b.clone()),
            c.clone(),
        );
        let right = ConversationAggregator::merge(a, ConversationAggregator::merge(b, c));

        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_identity() {
        let a = msgs(&["x", "y"]);
        assert_eq!(
            ConversationAggregator::merge(a.clone(), ConversationAggregator::default_value()),
            a
        );
        assert_eq!(
            ConversationAggregator::merge(ConversationAggregator::default_value(), a.clone()),
            a
        );
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let merged = ConversationAggregator::merge(msgs(&["same"]), msgs(&["same"]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_apply_and_last_text() {
        let mut state = ConversationState::default();
        assert_eq!(state.last_text_or("none"), "none");

        state.apply(PartialState::single(Message::user("hello")));
        state.apply(PartialState::empty());
        state.apply(PartialState::single(Message::system("noted")));

        assert_eq!(state.len(), 2);
        assert_eq!(state.last_text_or("none"), "noted");
        assert_eq!(state.messages()[0].text(), "hello");
    }
}
