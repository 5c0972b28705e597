//! Topic storage trait.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{NewTopic, Topic};

/// Error type for topic store operations.
#[derive(Debug, Error)]
pub enum TopicError {
    /// No topic with the given id.
    #[error("Topic not found: {0}")]
    NotFound(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for topic storage backends.
pub trait TopicStore: Send + Sync {
    /// Persist a new topic and return it with its assigned id.
    fn create(&self, topic: NewTopic) -> Result<Topic, TopicError>;

    /// Get a topic by id.
    fn get(&self, id: i64) -> Result<Option<Topic>, TopicError>;

    /// List all topics, oldest first.
    fn list(&self) -> Result<Vec<Topic>, TopicError>;

    /// List topics owned by one tracker plugin, oldest first.
    fn list_by_tracker(&self, tracker_name: &str) -> Result<Vec<Topic>, TopicError>;

    /// Replace a topic's display settings.
    fn update_display_settings(
        &self,
        id: i64,
        settings: serde_json::Value,
    ) -> Result<(), TopicError>;

    /// Record the timestamp of a successful check.
    fn set_last_check(&self, id: i64, at: DateTime<Utc>) -> Result<(), TopicError>;

    /// Remove a topic. Removing an unknown id is an error, not a no-op.
    fn remove(&self, id: i64) -> Result<(), TopicError>;
}
