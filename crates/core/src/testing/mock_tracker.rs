//! Mock tracker plugin for testing.

use async_trait::async_trait;

use crate::topic::Topic;
use crate::tracker::{
    CheckResult, DownloadItem, FormSchema, ParsedTopic, TrackerError, TrackerPlugin,
};

/// What `check` should do for every topic.
#[derive(Debug, Clone)]
enum CheckBehavior {
    Unchanged,
    Fail,
    Hang,
    Download(String),
}

/// Mock implementation of the `TrackerPlugin` trait.
///
/// Claims every URL containing its domain, parses the last path segment as
/// the title, and checks resolve to `Unchanged` unless configured
/// otherwise via the builder methods.
pub struct MockTracker {
    name: String,
    domain: String,
    online: bool,
    accept_settings: bool,
    check_behavior: CheckBehavior,
}

impl MockTracker {
    /// Create a mock tracker claiming URLs that contain `domain`.
    pub fn new(name: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            online: true,
            accept_settings: true,
            check_behavior: CheckBehavior::Unchanged,
        }
    }

    /// Reject every settings payload with `InvalidSettings`.
    pub fn reject_settings(mut self) -> Self {
        self.accept_settings = false;
        self
    }

    /// Fail every connectivity probe.
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Fail every topic check with a plugin error.
    pub fn failing_checks(mut self) -> Self {
        self.check_behavior = CheckBehavior::Fail;
        self
    }

    /// Never resolve a topic check.
    pub fn hanging_checks(mut self) -> Self {
        self.check_behavior = CheckBehavior::Hang;
        self
    }

    /// Resolve every topic check with a downloaded item of this title.
    pub fn with_download(mut self, title: &str) -> Self {
        self.check_behavior = CheckBehavior::Download(title.to_string());
        self
    }
}

#[async_trait]
impl TrackerPlugin for MockTracker {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(&self.domain)
    }

    async fn parse(&self, url: &str) -> Result<ParsedTopic, TrackerError> {
        let title = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("untitled")
            .to_string();

        Ok(ParsedTopic {
            title,
            display_settings: serde_json::json!({}),
        })
    }

    fn validate_settings(
        &self,
        settings: &serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError> {
        if self.accept_settings {
            Ok(settings.clone())
        } else {
            Err(TrackerError::InvalidSettings(
                "Mock rejects all settings".to_string(),
            ))
        }
    }

    async fn check(&self, topic: &Topic) -> Result<CheckResult, TrackerError> {
        match &self.check_behavior {
            CheckBehavior::Unchanged => Ok(CheckResult::Unchanged),
            CheckBehavior::Fail => Err(TrackerError::Plugin("Mock check failure".to_string())),
            CheckBehavior::Hang => std::future::pending().await,
            CheckBehavior::Download(title) => Ok(CheckResult::Downloaded {
                item: DownloadItem {
                    title: title.clone(),
                    torrent: b"d8:announce0:e".to_vec(),
                    source_url: topic.url.clone(),
                },
                display_settings: None,
            }),
        }
    }

    async fn check_connection(&self) -> bool {
        self.online
    }

    fn settings_form(&self) -> FormSchema {
        FormSchema::empty()
    }
}
