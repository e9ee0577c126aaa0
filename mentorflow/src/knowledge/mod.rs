//! Shared knowledge store consulted and updated by pipeline stages.

mod store;

pub use store::{keys, KnowledgeStore};
