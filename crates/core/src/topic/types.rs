use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A watched subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Stable identifier assigned on creation.
    pub id: i64,
    /// Canonical source URL, immutable after creation.
    pub url: String,
    /// Name of the tracker plugin that owns this topic.
    pub tracker_name: String,
    /// Display title derived by the owning plugin at add time.
    pub title: String,
    /// Plugin-specific structured data, opaque to the engine.
    pub display_settings: serde_json::Value,
    /// Timestamp of the last successful check (None until first run).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    /// When the topic was created.
    pub created_at: DateTime<Utc>,
}

/// Request to persist a new topic.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub url: String,
    pub tracker_name: String,
    pub title: String,
    pub display_settings: serde_json::Value,
}
