//! Core data model: messages and the append-only conversation state.

mod message;
mod state;

pub use message::{Message, Role};
pub use state::{ConversationAggregator, ConversationState, PartialState};
