//! Mock client plugin for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::{ClientError, ClientPlugin};
use crate::tracker::{DownloadItem, FormSchema};

/// Mock implementation of the `ClientPlugin` trait.
///
/// Records every item it receives so tests can assert on routing.
pub struct MockClient {
    name: String,
    online: bool,
    fail_sends: bool,
    sent: RwLock<Vec<DownloadItem>>,
    settings: RwLock<Option<serde_json::Value>>,
}

impl MockClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            online: true,
            fail_sends: false,
            sent: RwLock::new(Vec::new()),
            settings: RwLock::new(None),
        }
    }

    /// Fail every connectivity probe.
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Fail every `send` with a plugin error.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Items received so far, in order.
    pub async fn sent_items(&self) -> Vec<DownloadItem> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl ClientPlugin for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings_form(&self) -> FormSchema {
        FormSchema::empty()
    }

    async fn get_settings(&self) -> Result<Option<serde_json::Value>, ClientError> {
        Ok(self.settings.read().await.clone())
    }

    async fn set_settings(&self, settings: serde_json::Value) -> Result<(), ClientError> {
        *self.settings.write().await = Some(settings);
        Ok(())
    }

    async fn check_connection(&self) -> bool {
        self.online
    }

    async fn send(&self, item: &DownloadItem) -> Result<(), ClientError> {
        if self.fail_sends {
            return Err(ClientError::Plugin("Mock send failure".to_string()));
        }
        self.sent.write().await.push(item.clone());
        Ok(())
    }
}
