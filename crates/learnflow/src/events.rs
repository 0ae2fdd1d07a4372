use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enrollment::StudentId;

/// Trait describing outbound notification hooks. Transitions, gradings, and
/// redemptions emit through this boundary; delivery mechanics live with the
/// collaborator behind it.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LearningEvent) -> Result<(), EventError>;
}

/// Notification-worthy fact emitted by the engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningEvent {
    pub template: String,
    pub student_id: StudentId,
    pub details: BTreeMap<String, String>,
}

impl LearningEvent {
    pub fn new(template: &str, student_id: StudentId) -> Self {
        Self {
            template: template.to_string(),
            student_id,
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
