//! Tracker plugin capability contracts.

use async_trait::async_trait;

use crate::topic::Topic;

use super::{CheckResult, FormSchema, ParsedTopic, TrackerError};

/// Contract every tracker plugin must satisfy.
///
/// The engine and managers dispatch only through this trait; no concrete
/// plugin is ever special-cased.
#[async_trait]
pub trait TrackerPlugin: Send + Sync {
    /// Plugin name used for registration and topic ownership.
    fn name(&self) -> &str;

    /// Whether this plugin claims the given subscription URL.
    fn matches(&self, url: &str) -> bool;

    /// Derive topic metadata from a subscription URL.
    async fn parse(&self, url: &str) -> Result<ParsedTopic, TrackerError>;

    /// Validate a settings payload, returning the normalized form.
    fn validate_settings(
        &self,
        settings: &serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError>;

    /// Validate an update and merge it into the current settings.
    ///
    /// The default merges object keys shallowly after validation, which
    /// suits plugins whose settings are a flat object.
    fn merge_settings(
        &self,
        current: &serde_json::Value,
        update: &serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError> {
        let update = self.validate_settings(update)?;
        let mut merged = match current {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if let serde_json::Value::Object(fields) = update {
            for (key, value) in fields {
                merged.insert(key, value);
            }
        }
        Ok(serde_json::Value::Object(merged))
    }

    /// Check one topic for new content.
    async fn check(&self, topic: &Topic) -> Result<CheckResult, TrackerError>;

    /// Probe connectivity to the tracker site. Never raises.
    async fn check_connection(&self) -> bool;

    /// Declarative per-topic settings form for the presentation layer.
    fn settings_form(&self) -> FormSchema;

    /// Credentials capability, if this tracker requires a login.
    fn credentials(&self) -> Option<&dyn TrackerCredentials> {
        None
    }
}

/// Optional credentials extension for trackers that require a login.
#[async_trait]
pub trait TrackerCredentials: Send + Sync {
    /// Declarative description of the required credential fields.
    fn credentials_form(&self) -> FormSchema;

    /// Stored credentials with secret fields redacted.
    async fn get_credentials(&self) -> Result<Option<serde_json::Value>, TrackerError>;

    /// Validate and persist credentials.
    async fn set_credentials(&self, credentials: serde_json::Value) -> Result<(), TrackerError>;
}
