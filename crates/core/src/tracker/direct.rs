//! Tracker plugin for direct .torrent URLs on configured domains.
//!
//! The site publishes a .torrent file at a stable URL and replaces it when
//! new content appears. A check fetches the file and compares its SHA-256
//! digest against the one recorded at the previous check.

use std::time::Duration;

use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::Client;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::DirectTrackerConfig;
use crate::topic::Topic;

use super::{
    CheckResult, DownloadItem, FormSchema, ParsedTopic, TrackerError, TrackerPlugin,
};

/// Plugin name used for registration.
pub const DIRECT_TRACKER_NAME: &str = "direct";

/// Watches direct .torrent download URLs.
pub struct DirectTracker {
    client: Client,
    url_pattern: Regex,
    domains: Vec<String>,
}

impl DirectTracker {
    /// Create the plugin from its configuration.
    pub fn new(config: &DirectTrackerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        let domains = config
            .domains
            .iter()
            .map(|d| regex_lite::escape(d))
            .collect::<Vec<_>>()
            .join("|");
        let url_pattern = Regex::new(&format!(
            r"^https?://(?:[a-zA-Z0-9-]+\.)*(?:{})/\S+\.torrent$",
            domains
        ))
        .expect("Invalid domain pattern");

        Self {
            client,
            url_pattern,
            domains: config.domains.clone(),
        }
    }

    async fn fetch_torrent(&self, url: &str) -> Result<Vec<u8>, TrackerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::Plugin(format!("Fetch failed: {}", e)))?;

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

/// Derive a display title from a .torrent URL's filename.
pub(super) fn title_from_url(url: &str) -> String {
    let filename = url
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".torrent");
    let decoded = urlencoding::decode(filename)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| filename.to_string());
    decoded.replace(['.', '_'], " ").trim().to_string()
}

/// SHA-256 digest of torrent bytes as lowercase hex.
pub(super) fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Compare fetched bytes against the digest recorded in display settings.
///
/// Returns `Unchanged` when the digest matches, otherwise a `Downloaded`
/// result carrying the new baseline digest.
pub(super) fn digest_check(topic: &Topic, url: &str, data: Vec<u8>) -> CheckResult {
    let digest = content_digest(&data);
    let previous = topic.display_settings.get("digest").and_then(|v| v.as_str());

    if previous == Some(digest.as_str()) {
        return CheckResult::Unchanged;
    }

    let mut settings = topic.display_settings.clone();
    if let serde_json::Value::Object(ref mut map) = settings {
        map.insert("digest".to_string(), json!(digest));
    } else {
        settings = json!({ "digest": digest });
    }

    CheckResult::Downloaded {
        item: DownloadItem {
            title: topic.title.clone(),
            torrent: data,
            source_url: url.to_string(),
        },
        display_settings: Some(settings),
    }
}

#[async_trait]
impl TrackerPlugin for DirectTracker {
    fn name(&self) -> &str {
        DIRECT_TRACKER_NAME
    }

    fn matches(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
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
        debug!(topic_id = topic.id, bytes = data.len(), "Fetched torrent");
        Ok(digest_check(topic, &topic.url, data))
    }

    async fn check_connection(&self) -> bool {
        let Some(domain) = self.domains.first() else {
            return false;
        };

        let url = format!("https://{}/", domain);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success() || response.status().is_redirection(),
            Err(_) => false,
        }
    }

    fn settings_form(&self) -> FormSchema {
        FormSchema::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plugin() -> DirectTracker {
        DirectTracker::new(&DirectTrackerConfig {
            domains: vec!["example.com".to_string(), "mirror.org".to_string()],
            timeout_secs: 5,
        })
    }

    fn topic_with_digest(digest: Option<&str>) -> Topic {
        Topic {
            id: 1,
            url: "http://example.com/show.torrent".to_string(),
            tracker_name: DIRECT_TRACKER_NAME.to_string(),
            title: "show".to_string(),
            display_settings: match digest {
                Some(d) => json!({ "digest": d }),
                None => json!({}),
            },
            last_check: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_configured_domains_only() {
        let plugin = plugin();
        assert!(plugin.matches("http://example.com/show.torrent"));
        assert!(plugin.matches("https://dl.example.com/a/b/show.torrent"));
        assert!(plugin.matches("https://mirror.org/show.torrent"));
        assert!(!plugin.matches("http://other.com/show.torrent"));
        assert!(!plugin.matches("http://example.com/show.html"));
        assert!(!plugin.matches("ftp://example.com/show.torrent"));
    }

    #[test]
    fn test_title_from_url_decodes_and_cleans() {
        assert_eq!(
            title_from_url("http://example.com/Some.Show.S01_1080p.torrent"),
            "Some Show S01 1080p"
        );
        assert_eq!(
            title_from_url("http://example.com/Some%20Show.torrent"),
            "Some Show"
        );
    }

    #[tokio::test]
    async fn test_parse_rejects_foreign_url() {
        let plugin = plugin();
        let err = plugin.parse("http://other.com/x.torrent").await.unwrap_err();
        assert!(matches!(err, TrackerError::NoMatchingTracker(_)));
    }

    #[tokio::test]
    async fn test_parse_derives_title() {
        let plugin = plugin();
        let parsed = plugin
            .parse("http://example.com/Some.Show.torrent")
            .await
            .unwrap();
        assert_eq!(parsed.title, "Some Show");
    }

    #[test]
    fn test_validate_settings_rejects_non_object() {
        let plugin = plugin();
        assert!(plugin.validate_settings(&json!({"a": 1})).is_ok());
        assert!(plugin.validate_settings(&json!(null)).is_ok());
        assert!(plugin.validate_settings(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_digest_check_unchanged_when_digest_matches() {
        let data = b"torrent-bytes".to_vec();
        let digest = content_digest(&data);
        let topic = topic_with_digest(Some(&digest));

        let result = digest_check(&topic, &topic.url.clone(), data);
        assert!(matches!(result, CheckResult::Unchanged));
    }

    #[test]
    fn test_digest_check_downloads_on_new_content() {
        let topic = topic_with_digest(Some("stale"));
        let data = b"new-torrent-bytes".to_vec();

        match digest_check(&topic, &topic.url.clone(), data.clone()) {
            CheckResult::Downloaded {
                item,
                display_settings,
            } => {
                assert_eq!(item.torrent, data);
                let settings = display_settings.unwrap();
                assert_eq!(settings["digest"], content_digest(&data));
            }
            CheckResult::Unchanged => panic!("Expected Downloaded"),
        }
    }

    #[test]
    fn test_digest_check_first_check_downloads() {
        let topic = topic_with_digest(None);
        let result = digest_check(&topic, &topic.url.clone(), b"bytes".to_vec());
        assert!(matches!(result, CheckResult::Downloaded { .. }));
    }

    #[test]
    fn test_no_credentials_capability() {
        assert!(plugin().credentials().is_none());
    }
}
