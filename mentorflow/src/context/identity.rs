//! Run identity for correlating events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Time-ordered unique id of this run.
    pub run_id: Uuid,
    /// The conversation thread the run belongs to.
    pub thread_id: String,
    /// When the run was started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a fresh identity for a run on `thread_id`.
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            thread_id: thread_id.into(),
            started_at: Utc::now(),
        }
    }

    /// Milliseconds elapsed since the run started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}
