//! Transcript assertions.

use crate::core::{ConversationState, Role};

/// Asserts that the transcript's roles are exactly `expected`, in order.
pub fn assert_roles(state: &ConversationState, expected: &[Role]) {
    let actual: Vec<Role> = state.messages().iter().map(|m| m.role()).collect();
    assert_eq!(
        actual, expected,
        "Expected roles {expected:?}, got {actual:?}"
    );
}

/// Asserts that the message at `index` contains `needle`.
pub fn assert_text_contains(state: &ConversationState, index: usize, needle: &str) {
    let message = state
        .messages()
        .get(index)
        .unwrap_or_else(|| panic!("No message at index {index}; transcript has {}", state.len()));
    assert!(
        message.text().contains(needle),
        "Expected message {index} to contain '{needle}', got '{}'",
        message.text()
    );
}
