//! Types shared by tracker plugins and the trackers manager.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topic::TopicError;

/// Errors that can occur during tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No registered plugin claims the given URL.
    #[error("No registered tracker matches URL: {0}")]
    NoMatchingTracker(String),

    /// Settings operation on an unregistered tracker name.
    #[error("Unknown tracker: {0}")]
    UnknownTracker(String),

    /// The owning plugin rejected the settings payload.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Topic store failure.
    #[error(transparent)]
    Topic(#[from] TopicError),

    /// Lower-level I/O or protocol failure inside a plugin.
    #[error("Plugin failure: {0}")]
    Plugin(String),
}

/// A torrent discovered by a tracker check, ready to hand to a client.
#[derive(Debug, Clone)]
pub struct DownloadItem {
    /// Human-readable title, used in log events and filenames.
    pub title: String,
    /// Raw .torrent file contents.
    pub torrent: Vec<u8>,
    /// URL the torrent was fetched from.
    pub source_url: String,
}

/// Result of checking one topic against its tracker.
#[derive(Debug, Clone)]
pub enum CheckResult {
    /// Nothing new since the last check.
    Unchanged,
    /// New content was found.
    Downloaded {
        item: DownloadItem,
        /// Updated display settings to persist (e.g., the new content
        /// digest), so the next check sees the new baseline.
        display_settings: Option<serde_json::Value>,
    },
}

/// Metadata a plugin derives from a subscription URL.
#[derive(Debug, Clone)]
pub struct ParsedTopic {
    /// Display title for the topic.
    pub title: String,
    /// Initial plugin-specific display settings.
    pub display_settings: serde_json::Value,
}

/// Preview of what `add_topic` would create, without persisting.
#[derive(Debug, Clone, Serialize)]
pub struct TopicPreview {
    pub tracker_name: String,
    pub title: String,
    pub settings_form: FormSchema,
}

/// Per-topic result yielded by a run.
#[derive(Debug, Clone)]
pub struct TopicOutcome {
    pub topic_id: i64,
    pub title: String,
    pub kind: OutcomeKind,
}

/// What happened when a topic was checked.
#[derive(Debug, Clone)]
pub enum OutcomeKind {
    /// Checked successfully, nothing new.
    Unchanged,
    /// The check errored or timed out; the run continues.
    Failed(String),
    /// New content was found and should be routed to a client.
    Downloaded(DownloadItem),
}

impl OutcomeKind {
    /// Label used for metrics and log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Unchanged => "unchanged",
            OutcomeKind::Failed(_) => "failed",
            OutcomeKind::Downloaded(_) => "downloaded",
        }
    }
}

/// Registered tracker description for the settings surface.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerInfo {
    pub name: String,
    pub form: FormSchema,
    pub supports_credentials: bool,
}

/// Declarative description of a settings form.
///
/// Consumed only by the presentation layer; the core never interprets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Schema with no fields.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A single field in a settings form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(name: &str, label: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required,
        }
    }
}

/// Input kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Password,
    Number,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kind_labels() {
        assert_eq!(OutcomeKind::Unchanged.as_str(), "unchanged");
        assert_eq!(OutcomeKind::Failed("x".to_string()).as_str(), "failed");
        let item = DownloadItem {
            title: "t".to_string(),
            torrent: vec![],
            source_url: "http://example.com/t.torrent".to_string(),
        };
        assert_eq!(OutcomeKind::Downloaded(item).as_str(), "downloaded");
    }

    #[test]
    fn test_form_schema_serialization() {
        let form = FormSchema {
            fields: vec![
                FormField::new("username", "Username", FieldKind::Text, true),
                FormField::new("password", "Password", FieldKind::Password, true),
            ],
        };

        let json = serde_json::to_string(&form).unwrap();
        assert!(json.contains("\"password\""));
        assert!(json.contains("\"kind\":\"password\""));
    }
}
