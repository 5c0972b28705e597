//! Registry of client plugins and routing of discovered items.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::tracker::DownloadItem;

use super::{ClientError, ClientInfo, ClientPlugin};

/// Owns the client plugin registry and routes discovered torrents.
///
/// The registry is read-only after construction.
pub struct ClientsManager {
    clients: HashMap<String, Arc<dyn ClientPlugin>>,
    default_client: Option<String>,
}

impl ClientsManager {
    /// Create a manager over the given plugins.
    pub fn new(plugins: Vec<Arc<dyn ClientPlugin>>, default_client: Option<String>) -> Self {
        let clients: HashMap<String, Arc<dyn ClientPlugin>> = plugins
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        if let Some(ref name) = default_client {
            if !clients.contains_key(name) {
                warn!(client = name.as_str(), "Default client is not registered");
            }
        }

        Self {
            clients,
            default_client,
        }
    }

    /// Registered clients with their form schemas.
    pub fn list(&self) -> Vec<ClientInfo> {
        let mut infos: Vec<ClientInfo> = self
            .clients
            .values()
            .map(|plugin| ClientInfo {
                name: plugin.name().to_string(),
                form: plugin.settings_form(),
                is_default: self.default_client.as_deref() == Some(plugin.name()),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    fn plugin(&self, name: &str) -> Result<&Arc<dyn ClientPlugin>, ClientError> {
        self.clients
            .get(name)
            .ok_or_else(|| ClientError::UnknownClient(name.to_string()))
    }

    /// Stored settings for a registered client.
    pub async fn get_settings(
        &self,
        name: &str,
    ) -> Result<Option<serde_json::Value>, ClientError> {
        self.plugin(name)?.get_settings().await
    }

    /// Validate and persist settings for a registered client.
    pub async fn set_settings(
        &self,
        name: &str,
        settings: serde_json::Value,
    ) -> Result<(), ClientError> {
        self.plugin(name)?.set_settings(settings).await
    }

    /// Probe connectivity for a registered client. Never raises.
    pub async fn check_connection(&self, name: &str) -> bool {
        match self.clients.get(name) {
            Some(plugin) => plugin.check_connection().await,
            None => {
                warn!(client = name, "Connectivity probe for unknown client");
                false
            }
        }
    }

    /// Hand an item to the named client, or the default when none given.
    pub async fn send(
        &self,
        item: &DownloadItem,
        client_name: Option<&str>,
    ) -> Result<(), ClientError> {
        let name = match client_name {
            Some(name) => name,
            None => self
                .default_client
                .as_deref()
                .ok_or(ClientError::NoDefaultClient)?,
        };

        let plugin = self.plugin(name)?;
        plugin.send(item).await?;
        debug!(client = name, title = item.title.as_str(), "Item sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;

    fn item() -> DownloadItem {
        DownloadItem {
            title: "Some Show".to_string(),
            torrent: b"d4:infoe".to_vec(),
            source_url: "http://example.com/show.torrent".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_routes_to_named_client() {
        let a = Arc::new(MockClient::new("a"));
        let b = Arc::new(MockClient::new("b"));
        let manager = ClientsManager::new(vec![a.clone(), b.clone()], Some("a".to_string()));

        manager.send(&item(), Some("b")).await.unwrap();

        assert_eq!(a.sent_items().await.len(), 0);
        assert_eq!(b.sent_items().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_falls_back_to_default() {
        let a = Arc::new(MockClient::new("a"));
        let manager = ClientsManager::new(vec![a.clone()], Some("a".to_string()));

        manager.send(&item(), None).await.unwrap();
        assert_eq!(a.sent_items().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_default_fails() {
        let a = Arc::new(MockClient::new("a"));
        let manager = ClientsManager::new(vec![a], None);

        let err = manager.send(&item(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::NoDefaultClient));
    }

    #[tokio::test]
    async fn test_send_to_unknown_client_fails() {
        let manager = ClientsManager::new(vec![], None);
        let err = manager.send(&item(), Some("ghost")).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownClient(_)));
    }

    #[tokio::test]
    async fn test_check_connection_never_raises() {
        let offline = Arc::new(MockClient::new("offline").offline());
        let manager = ClientsManager::new(vec![offline], None);

        assert!(!manager.check_connection("offline").await);
        assert!(!manager.check_connection("ghost").await);
    }

    #[tokio::test]
    async fn test_settings_on_unknown_client() {
        let manager = ClientsManager::new(vec![], None);
        let err = manager.get_settings("ghost").await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownClient(_)));
    }

    #[tokio::test]
    async fn test_list_marks_default() {
        let a = Arc::new(MockClient::new("a"));
        let b = Arc::new(MockClient::new("b"));
        let manager = ClientsManager::new(vec![a, b], Some("b".to_string()));

        let infos = manager.list();
        assert_eq!(infos.len(), 2);
        assert!(!infos[0].is_default);
        assert!(infos[1].is_default);
    }
}
