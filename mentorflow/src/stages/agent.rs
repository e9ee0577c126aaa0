//! A transient agent used to demonstrate role-based knowledge sharing.
//!
//! Agents here are plain values. They are built inside a stage invocation and
//! dropped with it; they never touch persisted agent records.

use crate::context::StageContext;
use crate::knowledge::KnowledgeStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Experience above which a mentee is promoted to mentor.
pub const PROMOTION_THRESHOLD: u32 = 10;

/// The role an agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Shares knowledge.
    Mentor,
    /// Learns from a mentor.
    #[default]
    Mentee,
}

/// A non-persisted agent value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntity {
    /// Agent id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Current role.
    pub role: AgentRole,
    /// Accumulated experience.
    pub experience: u32,
    /// The mentor this agent learns from, if any.
    pub mentor_id: Option<u64>,
    /// Knowledge local to this agent.
    #[serde(default)]
    pub knowledge: HashMap<String, serde_json::Value>,
}

impl AgentEntity {
    /// Creates a mentee with no experience and no mentor.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: AgentRole::default(),
            experience: 0,
            mentor_id: None,
            knowledge: HashMap::new(),
        }
    }

    /// Creates a mentor with the given experience.
    #[must_use]
    pub fn mentor(id: u64, name: impl Into<String>, experience: u32) -> Self {
        Self {
            role: AgentRole::Mentor,
            experience,
            ..Self::new(id, name)
        }
    }

    /// Assigns a mentor.
    #[must_use]
    pub fn with_mentor(mut self, mentor_id: u64) -> Self {
        self.mentor_id = Some(mentor_id);
        self
    }

    /// Pulls guidance from the assigned mentor into local knowledge.
    ///
    /// Only mentees with a mentor receive guidance. Returns whether any was
    /// received.
    pub fn request_guidance(&mut self) -> bool {
        match (self.role, self.mentor_id) {
            (AgentRole::Mentee, Some(mentor_id)) => {
                info!(agent = %self.name, mentor_id, "requesting guidance");
                self.knowledge
                    .insert("tactic".to_string(), serde_json::json!("optimized-strategy"));
                true
            }
            _ => false,
        }
    }

    /// Publishes a piece of knowledge to the shared store.
    pub fn share_knowledge(&self, ctx: &StageContext, key: &str, value: impl Into<serde_json::Value>) {
        ctx.update_knowledge(key, value);
    }

    /// Copies a shared value into local knowledge.
    ///
    /// Absent and `null` values are ignored. Returns whether anything was copied.
    pub fn learn_from(&mut self, store: &KnowledgeStore, key: &str) -> bool {
        match store.get(key) {
            Some(value) if !value.is_null() => {
                self.knowledge.insert(key.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Adds experience, promoting a mentee once it passes the threshold.
    pub fn gain_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
        if self.experience > PROMOTION_THRESHOLD && self.role != AgentRole::Mentor {
            info!(agent = %self.name, experience = self.experience, "promoted to mentor");
            self.role = AgentRole::Mentor;
        }
    }
}
