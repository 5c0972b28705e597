use serde::Serialize;
use thiserror::Error;

use crate::tracker::FormSchema;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Operation on an unregistered client name.
    #[error("Unknown client: {0}")]
    UnknownClient(String),

    /// No client named and no default configured.
    #[error("No default client configured")]
    NoDefaultClient,

    /// The plugin rejected the settings payload.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Lower-level I/O or protocol failure inside a plugin.
    #[error("Plugin failure: {0}")]
    Plugin(String),
}

/// Registered client description for the settings surface.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub form: FormSchema,
    /// Whether this is the client that receives items by default.
    pub is_default: bool,
}
