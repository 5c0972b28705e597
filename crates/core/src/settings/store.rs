use thiserror::Error;

/// Error type for settings store operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid settings payload: {0}")]
    Serialization(String),
}

/// Trait for plugin settings storage backends.
pub trait SettingsStore: Send + Sync {
    /// Get the stored settings blob for a plugin, if any.
    fn get(&self, plugin_name: &str) -> Result<Option<serde_json::Value>, SettingsError>;

    /// Store (insert or replace) the settings blob for a plugin.
    fn set(&self, plugin_name: &str, settings: &serde_json::Value) -> Result<(), SettingsError>;
}
