//! Process-lifetime key/value store shared by every run.

use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Well-known keys written by the built-in stages.
pub mod keys {
    /// The mentor's advice, written by the mentor stage.
    pub const MENTOR_TIPS: &str = "mentorTips";
    /// The detected framework, written by the knowledge-check stage.
    pub const FRAMEWORK: &str = "framework";
}

/// Best-effort shared context.
///
/// One instance is constructed by the host and handed to every runner as an
/// `Arc<KnowledgeStore>`. Writes are last-write-wins across runs; there is no
/// versioning, expiry or capacity bound. Access is serialized per key by the
/// underlying concurrent map, so concurrent runs never observe a torn value.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    entries: DashMap<String, serde_json::Value>,
}

impl KnowledgeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn update(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        let key = key.into();
        debug!(key = %key, "knowledge updated");
        self.entries.insert(key, value.into());
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Returns the value under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value().as_str().map(str::to_owned))
    }

    /// Returns an owned snapshot of every entry.
    ///
    /// Later writes to the store do not affect the returned map.
    #[must_use]
    pub fn get_all(&self) -> HashMap<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Returns true if `key` has a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_get_after_update() {
        let store = KnowledgeStore::new();
        assert!(store.get("framework").is_none());

        store.update("framework", "React");
        assert_eq!(store.get("framework"), Some(json!("React")));
        assert_eq!(store.get_str("framework").as_deref(), Some("React"));
    }

    #[test]
    fn test_last_write_wins() {
        let store = KnowledgeStore::new();
        store.update("framework", "React");
        store.update("framework", "Node.js");

        assert_eq!(store.get("framework"), Some(json!("Node.js")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_opaque_values() {
        let store = KnowledgeStore::new();
        store.update("profile", json!({"level": 3, "tags": ["rust"]}));

        assert_eq!(store.get("profile").unwrap()["level"], 3);
        assert!(store.get_str("profile").is_none());
    }

    #[test]
    fn test_get_all_is_a_snapshot() {
        let store = KnowledgeStore::new();
        store.update("a", 1);

        let mut snapshot = store.get_all();
        snapshot.insert("b".to_string(), json!(2));
        store.update("a", 10);

        assert_eq!(snapshot.get("a"), Some(&json!(1)));
        assert!(!store.contains_key("b"));
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(KnowledgeStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.update("shared", format!("writer-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = store.get_str("shared").unwrap();
        assert!(value.starts_with("writer-"));
        assert_eq!(store.len(), 1);
    }
}
