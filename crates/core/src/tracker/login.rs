//! Tracker plugin for sites that gate .torrent downloads behind a login.
//!
//! Works like the direct plugin (digest-based change detection) but
//! authenticates first with a form POST and a cookie session. Credentials
//! live in the settings store via the [`TrackerCredentials`] capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::LoginTrackerConfig;
use crate::settings::SettingsStore;
use crate::topic::Topic;

use super::direct::{digest_check, title_from_url};
use super::{
    CheckResult, FieldKind, FormField, FormSchema, ParsedTopic, TrackerCredentials, TrackerError,
    TrackerPlugin,
};

/// Plugin name used for registration.
pub const LOGIN_TRACKER_NAME: &str = "login";

/// Watches .torrent URLs behind a cookie login.
pub struct LoginTracker {
    client: Client,
    base_url: String,
    login_path: String,
    settings: Arc<dyn SettingsStore>,
    /// Whether the cookie jar holds a live session.
    authenticated: RwLock<bool>,
}

impl LoginTracker {
    /// Create the plugin from its configuration and the settings store
    /// that holds its credentials.
    pub fn new(config: &LoginTrackerConfig, settings: Arc<dyn SettingsStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            settings,
            authenticated: RwLock::new(false),
        }
    }

    fn stored_credentials(&self) -> Result<(String, String), TrackerError> {
        let stored = self
            .settings
            .get(LOGIN_TRACKER_NAME)
            .map_err(|e| TrackerError::Plugin(e.to_string()))?
            .ok_or_else(|| {
                TrackerError::Plugin("No credentials configured for this tracker".to_string())
            })?;

        let username = stored
            .get("username")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TrackerError::Plugin("Stored credentials lack username".to_string()))?;
        let password = stored
            .get("password")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TrackerError::Plugin("Stored credentials lack password".to_string()))?;

        Ok((username.to_string(), password.to_string()))
    }

    /// Login and populate the cookie jar.
    async fn login(&self) -> Result<(), TrackerError> {
        let (username, password) = self.stored_credentials()?;
        let url = format!("{}{}", self.base_url, self.login_path);

        let params = [
            ("login_username", username.as_str()),
            ("login_password", password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TrackerError::Plugin(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(TrackerError::Plugin(format!(
                "Login rejected with HTTP {}",
                status
            )));
        }
        if !status.is_success() && !status.is_redirection() {
            return Err(TrackerError::Plugin(format!("Login failed: HTTP {}", status)));
        }

        debug!(tracker = LOGIN_TRACKER_NAME, "Login successful");
        *self.authenticated.write().await = true;
        Ok(())
    }

    async fn ensure_authenticated(&self) -> Result<(), TrackerError> {
        if *self.authenticated.read().await {
            return Ok(());
        }
        self.login().await
    }

    async fn fetch_torrent(&self, url: &str) -> Result<Vec<u8>, TrackerError> {
        self.ensure_authenticated().await?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::Plugin(format!("Fetch failed: {}", e)))?;

        // Session may have expired since the last run.
        if response.status().as_u16() == 401 || response.status().as_u16() == 403 {
            warn!(tracker = LOGIN_TRACKER_NAME, "Session expired, re-authenticating");
            *self.authenticated.write().await = false;
            self.login().await?;

            response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| TrackerError::Plugin(format!("Fetch failed: {}", e)))?;
        }

        if !response.status().is_success() {
            return Err(TrackerError::Plugin(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TrackerError::Plugin(format!("Failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TrackerPlugin for LoginTracker {
    fn name(&self) -> &str {
        LOGIN_TRACKER_NAME
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(&self.base_url) && url.len() > self.base_url.len() + 1
    }

    async fn parse(&self, url: &str) -> Result<ParsedTopic, TrackerError> {
        if !self.matches(url) {
            return Err(TrackerError::NoMatchingTracker(url.to_string()));
        }

        Ok(ParsedTopic {
            title: title_from_url(url),
            display_settings: json!({}),
        })
    }

    fn validate_settings(
        &self,
        settings: &serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError> {
        match settings {
            serde_json::Value::Object(_) => Ok(settings.clone()),
            serde_json::Value::Null => Ok(json!({})),
            _ => Err(TrackerError::InvalidSettings(
                "Expected a settings object".to_string(),
            )),
        }
    }

    async fn check(&self, topic: &Topic) -> Result<CheckResult, TrackerError> {
        let data = self.fetch_torrent(&topic.url).await?;
        Ok(digest_check(topic, &topic.url, data))
    }

    async fn check_connection(&self) -> bool {
        match self.client.get(format!("{}/", self.base_url)).send().await {
            Ok(response) => response.status().is_success() || response.status().is_redirection(),
            Err(_) => false,
        }
    }

    fn settings_form(&self) -> FormSchema {
        FormSchema::empty()
    }

    fn credentials(&self) -> Option<&dyn TrackerCredentials> {
        Some(self)
    }
}

#[async_trait]
impl TrackerCredentials for LoginTracker {
    fn credentials_form(&self) -> FormSchema {
        FormSchema {
            fields: vec![
                FormField::new("username", "Username", FieldKind::Text, true),
                FormField::new("password", "Password", FieldKind::Password, true),
            ],
        }
    }

    async fn get_credentials(&self) -> Result<Option<serde_json::Value>, TrackerError> {
        let stored = self
            .settings
            .get(LOGIN_TRACKER_NAME)
            .map_err(|e| TrackerError::Plugin(e.to_string()))?;

        Ok(stored.map(|value| {
            json!({
                "username": value.get("username").cloned().unwrap_or(serde_json::Value::Null),
                "password_configured": value
                    .get("password")
                    .and_then(|p| p.as_str())
                    .is_some_and(|p| !p.is_empty()),
            })
        }))
    }

    async fn set_credentials(&self, credentials: serde_json::Value) -> Result<(), TrackerError> {
        let valid = credentials.get("username").and_then(|v| v.as_str()).is_some()
            && credentials.get("password").and_then(|v| v.as_str()).is_some();
        if !valid {
            return Err(TrackerError::InvalidSettings(
                "Credentials require 'username' and 'password' strings".to_string(),
            ));
        }

        self.settings
            .set(LOGIN_TRACKER_NAME, &credentials)
            .map_err(|e| TrackerError::Plugin(e.to_string()))?;

        // Force a fresh login with the new credentials on the next check.
        *self.authenticated.write().await = false;
        Ok(())
    }
}
