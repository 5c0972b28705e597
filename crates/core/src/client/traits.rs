//! Client plugin capability contract.

use async_trait::async_trait;

use crate::tracker::{DownloadItem, FormSchema};

use super::ClientError;

/// Contract every download client plugin must satisfy.
#[async_trait]
pub trait ClientPlugin: Send + Sync {
    /// Plugin name used for registration.
    fn name(&self) -> &str;

    /// Declarative settings form for the presentation layer.
    fn settings_form(&self) -> FormSchema;

    /// Stored settings with secret fields redacted.
    async fn get_settings(&self) -> Result<Option<serde_json::Value>, ClientError>;

    /// Validate and persist settings.
    async fn set_settings(&self, settings: serde_json::Value) -> Result<(), ClientError>;

    /// Probe connectivity to the back-end. Never raises.
    async fn check_connection(&self) -> bool;

    /// Hand a discovered torrent to the back-end.
    async fn send(&self, item: &DownloadItem) -> Result<(), ClientError>;
}
