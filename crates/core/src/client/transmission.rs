//! Transmission RPC client plugin.
//!
//! Speaks the Transmission JSON-RPC protocol: the daemon answers the first
//! request with HTTP 409 and an `X-Transmission-Session-Id` header that
//! must be echoed on subsequent requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::TransmissionConfig;
use crate::settings::SettingsStore;
use crate::tracker::{DownloadItem, FieldKind, FormField, FormSchema};

use super::{ClientError, ClientPlugin};

/// Plugin name used for registration.
pub const TRANSMISSION_CLIENT_NAME: &str = "transmission";

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Hands torrents to a Transmission daemon over its RPC endpoint.
pub struct TransmissionClient {
    client: Client,
    config: TransmissionConfig,
    settings: Arc<dyn SettingsStore>,
    session_id: RwLock<Option<String>>,
}

/// Connection settings after applying stored overrides to the config.
#[derive(Debug, Clone)]
struct EffectiveSettings {
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl TransmissionClient {
    /// Create the plugin from its configuration and the settings store
    /// that may hold runtime overrides.
    pub fn new(config: TransmissionConfig, settings: Arc<dyn SettingsStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            settings,
            session_id: RwLock::new(None),
        }
    }

    fn effective_settings(&self) -> Result<EffectiveSettings, ClientError> {
        let stored = self
            .settings
            .get(TRANSMISSION_CLIENT_NAME)
            .map_err(|e| ClientError::Plugin(e.to_string()))?;

        let get_str = |key: &str| -> Option<String> {
            stored
                .as_ref()
                .and_then(|v| v.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Ok(EffectiveSettings {
            url: get_str("url").unwrap_or_else(|| self.config.url.clone()),
            username: get_str("username").or_else(|| self.config.username.clone()),
            password: get_str("password").or_else(|| self.config.password.clone()),
        })
    }

    /// Issue one RPC call, retrying once on the 409 session handshake.
    async fn rpc(
        &self,
        method: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let settings = self.effective_settings()?;
        let body = json!({ "method": method, "arguments": arguments });

        for _ in 0..2 {
            let mut request = self.client.post(&settings.url).json(&body);

            if let Some(ref session_id) = *self.session_id.read().await {
                request = request.header(SESSION_HEADER, session_id);
            }
            if let (Some(ref user), Some(ref pass)) = (&settings.username, &settings.password) {
                request = request.basic_auth(user, Some(pass));
            }

            let response = request
                .send()
                .await
                .map_err(|e| ClientError::Plugin(format!("RPC request failed: {}", e)))?;

            if response.status().as_u16() == 409 {
                let new_session = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        ClientError::Plugin("409 without session id header".to_string())
                    })?;
                debug!("Transmission session id refreshed");
                *self.session_id.write().await = Some(new_session);
                continue;
            }

            if response.status().as_u16() == 401 {
                return Err(ClientError::Plugin(
                    "Transmission authentication failed".to_string(),
                ));
            }
            if !response.status().is_success() {
                return Err(ClientError::Plugin(format!(
                    "Transmission RPC: HTTP {}",
                    response.status()
                )));
            }

            let payload: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ClientError::Plugin(format!("Invalid RPC response: {}", e)))?;

            let result = payload.get("result").and_then(|v| v.as_str()).unwrap_or("");
            if result != "success" {
                return Err(ClientError::Plugin(format!(
                    "Transmission RPC error: {}",
                    result
                )));
            }

            return Ok(payload
                .get("arguments")
                .cloned()
                .unwrap_or(serde_json::Value::Null));
        }

        Err(ClientError::Plugin(
            "Session handshake did not converge".to_string(),
        ))
    }
}

#[async_trait]
impl ClientPlugin for TransmissionClient {
    fn name(&self) -> &str {
        TRANSMISSION_CLIENT_NAME
    }

    fn settings_form(&self) -> FormSchema {
        FormSchema {
            fields: vec![
                FormField::new("url", "RPC URL", FieldKind::Text, true),
                FormField::new("username", "Username", FieldKind::Text, false),
                FormField::new("password", "Password", FieldKind::Password, false),
            ],
        }
    }

    async fn get_settings(&self) -> Result<Option<serde_json::Value>, ClientError> {
        let stored = self
            .settings
            .get(TRANSMISSION_CLIENT_NAME)
            .map_err(|e| ClientError::Plugin(e.to_string()))?;

        Ok(stored.map(|value| {
            json!({
                "url": value.get("url").cloned().unwrap_or(serde_json::Value::Null),
                "username": value.get("username").cloned().unwrap_or(serde_json::Value::Null),
                "password_configured": value
                    .get("password")
                    .and_then(|p| p.as_str())
                    .is_some_and(|p| !p.is_empty()),
            })
        }))
    }

    async fn set_settings(&self, settings: serde_json::Value) -> Result<(), ClientError> {
        if settings.get("url").and_then(|v| v.as_str()).is_none() {
            return Err(ClientError::InvalidSettings(
                "Settings require a 'url' string".to_string(),
            ));
        }

        self.settings
            .set(TRANSMISSION_CLIENT_NAME, &settings)
            .map_err(|e| ClientError::Plugin(e.to_string()))?;

        // New endpoint means the old session id is meaningless.
        *self.session_id.write().await = None;
        Ok(())
    }

    async fn check_connection(&self) -> bool {
        match self.rpc("session-get", json!({})).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Transmission connectivity probe failed: {}", e);
                false
            }
        }
    }

    async fn send(&self, item: &DownloadItem) -> Result<(), ClientError> {
        let metainfo = base64::engine::general_purpose::STANDARD.encode(&item.torrent);

        let arguments = self
            .rpc("torrent-add", json!({ "metainfo": metainfo }))
            .await?;

        if arguments.get("torrent-duplicate").is_some() {
            debug!(title = item.title.as_str(), "Torrent already present");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SqliteSettingsStore;

    fn plugin() -> TransmissionClient {
        let settings = Arc::new(SqliteSettingsStore::in_memory().unwrap());
        TransmissionClient::new(
            TransmissionConfig {
                url: "http://localhost:9091/transmission/rpc".to_string(),
                username: Some("admin".to_string()),
                password: Some("secret".to_string()),
                timeout_secs: 5,
            },
            settings,
        )
    }

    #[test]
    fn test_settings_form_fields() {
        let form = plugin().settings_form();
        let names: Vec<_> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["url", "username", "password"]);
    }

    #[tokio::test]
    async fn test_set_settings_requires_url() {
        let plugin = plugin();
        let err = plugin
            .set_settings(json!({"username": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidSettings(_)));
    }

    #[tokio::test]
    async fn test_get_settings_redacts_password() {
        let plugin = plugin();
        plugin
            .set_settings(json!({"url": "http://t:9091/rpc", "password": "secret"}))
            .await
            .unwrap();

        let stored = plugin.get_settings().await.unwrap().unwrap();
        assert_eq!(stored["url"], "http://t:9091/rpc");
        assert_eq!(stored["password_configured"], true);
        assert!(stored.get("password").is_none());
    }

    #[test]
    fn test_stored_settings_override_config() {
        let plugin = plugin();
        plugin
            .settings
            .set(TRANSMISSION_CLIENT_NAME, &json!({"url": "http://other:9091/rpc"}))
            .unwrap();

        let effective = plugin.effective_settings().unwrap();
        assert_eq!(effective.url, "http://other:9091/rpc");
        // Username falls back to config when not overridden.
        assert_eq!(effective.username.as_deref(), Some("admin"));
    }
}
