//! Watch directory client plugin.
//!
//! Drops `.torrent` files into a directory watched by an external
//! download client.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::WatchDirConfig;
use crate::tracker::{DownloadItem, FormSchema};

use super::{ClientError, ClientPlugin};

/// Plugin name used for registration.
pub const WATCH_DIR_CLIENT_NAME: &str = "watch_dir";

/// Writes discovered torrents as files into a watched directory.
pub struct WatchDirClient {
    path: PathBuf,
}

impl WatchDirClient {
    pub fn new(config: WatchDirConfig) -> Self {
        Self { path: config.path }
    }

    /// File name derived from the item title, safe for any filesystem.
    fn file_name(title: &str) -> String {
        let sanitized: String = title
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();
        let trimmed = sanitized.trim();
        if trimmed.is_empty() {
            "download.torrent".to_string()
        } else {
            format!("{}.torrent", trimmed)
        }
    }
}

#[async_trait]
impl ClientPlugin for WatchDirClient {
    fn name(&self) -> &str {
        WATCH_DIR_CLIENT_NAME
    }

    fn settings_form(&self) -> FormSchema {
        // The path comes from the configuration file, nothing to edit at
        // runtime.
        FormSchema { fields: vec![] }
    }

    async fn get_settings(&self) -> Result<Option<serde_json::Value>, ClientError> {
        Ok(Some(json!({ "path": self.path.display().to_string() })))
    }

    async fn set_settings(&self, _settings: serde_json::Value) -> Result<(), ClientError> {
        Err(ClientError::InvalidSettings(
            "The watch directory path is set in the configuration file".to_string(),
        ))
    }

    async fn check_connection(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => {
                warn!(path = %self.path.display(), "Watch directory not accessible: {}", e);
                false
            }
        }
    }

    async fn send(&self, item: &DownloadItem) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|e| ClientError::Plugin(format!("Cannot create watch directory: {}", e)))?;

        let target = self.path.join(Self::file_name(&item.title));
        tokio::fs::write(&target, &item.torrent)
            .await
            .map_err(|e| ClientError::Plugin(format!("Cannot write torrent file: {}", e)))?;

        debug!(path = %target.display(), "Torrent written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(dir: &std::path::Path) -> WatchDirClient {
        WatchDirClient::new(WatchDirConfig {
            path: dir.to_path_buf(),
        })
    }

    fn item(title: &str) -> DownloadItem {
        DownloadItem {
            title: title.to_string(),
            torrent: b"d4:infoe".to_vec(),
            source_url: "http://example.com/a.torrent".to_string(),
        }
    }

    #[test]
    fn test_file_name_sanitization() {
        assert_eq!(
            WatchDirClient::file_name("Some: Show / S01"),
            "Some_ Show _ S01.torrent"
        );
        assert_eq!(WatchDirClient::file_name("  "), "download.torrent");
    }

    #[tokio::test]
    async fn test_send_writes_torrent_file() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin(dir.path());

        plugin.send(&item("Some Show")).await.unwrap();

        let written = std::fs::read(dir.path().join("Some Show.torrent")).unwrap();
        assert_eq!(written, b"d4:infoe");
    }

    #[tokio::test]
    async fn test_send_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let plugin = plugin(&nested);

        plugin.send(&item("x")).await.unwrap();
        assert!(nested.join("x.torrent").exists());
    }

    #[tokio::test]
    async fn test_check_connection() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plugin(dir.path()).check_connection().await);
        assert!(!plugin(&dir.path().join("missing")).check_connection().await);
    }

    #[tokio::test]
    async fn test_settings_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin(dir.path());

        let err = plugin.set_settings(json!({"path": "/x"})).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidSettings(_)));

        let settings = plugin.get_settings().await.unwrap().unwrap();
        assert_eq!(settings["path"], dir.path().display().to_string());
    }
}
