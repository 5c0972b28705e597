//! Registry of tracker plugins and owner of the topic store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::topic::{NewTopic, Topic, TopicStore};

use super::{
    CheckResult, OutcomeKind, TopicOutcome, TopicPreview, TrackerError, TrackerInfo, TrackerPlugin,
};

/// Owns the topic store and mediates all access to tracker plugins.
///
/// The plugin registry is read-only after construction; topic CRUD is safe
/// to call concurrently with an in-flight run because `check_all` operates
/// on a snapshot of the store.
pub struct TrackersManager {
    trackers: HashMap<String, Arc<dyn TrackerPlugin>>,
    store: Arc<dyn TopicStore>,
    check_timeout: Duration,
    max_parallel_checks: usize,
}

impl TrackersManager {
    /// Create a manager over the given plugins and topic store.
    pub fn new(
        plugins: Vec<Arc<dyn TrackerPlugin>>,
        store: Arc<dyn TopicStore>,
        check_timeout: Duration,
        max_parallel_checks: usize,
    ) -> Self {
        let trackers = plugins
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();

        Self {
            trackers,
            store,
            check_timeout,
            max_parallel_checks: max_parallel_checks.max(1),
        }
    }

    /// Registered trackers with their form schemas.
    pub fn list(&self) -> Vec<TrackerInfo> {
        let mut infos: Vec<TrackerInfo> = self
            .trackers
            .values()
            .map(|plugin| TrackerInfo {
                name: plugin.name().to_string(),
                form: plugin
                    .credentials()
                    .map(|c| c.credentials_form())
                    .unwrap_or_else(|| plugin.settings_form()),
                supports_credentials: plugin.credentials().is_some(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    fn find_matching(&self, url: &str) -> Option<&Arc<dyn TrackerPlugin>> {
        self.trackers.values().find(|plugin| plugin.matches(url))
    }

    fn plugin(&self, name: &str) -> Result<&Arc<dyn TrackerPlugin>, TrackerError> {
        self.trackers
            .get(name)
            .ok_or_else(|| TrackerError::UnknownTracker(name.to_string()))
    }

    /// Create a topic for the URL via the plugin that claims it.
    pub async fn add_topic(
        &self,
        url: &str,
        settings: &serde_json::Value,
    ) -> Result<i64, TrackerError> {
        let plugin = self
            .find_matching(url)
            .ok_or_else(|| TrackerError::NoMatchingTracker(url.to_string()))?;

        let parsed = plugin.parse(url).await?;
        let display_settings = plugin.merge_settings(&parsed.display_settings, settings)?;

        let topic = self.store.create(NewTopic {
            url: url.to_string(),
            tracker_name: plugin.name().to_string(),
            title: parsed.title,
            display_settings,
        })?;

        debug!(topic_id = topic.id, tracker = plugin.name(), "Topic added");
        Ok(topic.id)
    }

    /// Preview what `add_topic` would create, without persisting.
    pub async fn prepare_add_topic(&self, url: &str) -> Result<TopicPreview, TrackerError> {
        let plugin = self
            .find_matching(url)
            .ok_or_else(|| TrackerError::NoMatchingTracker(url.to_string()))?;

        let parsed = plugin.parse(url).await?;

        Ok(TopicPreview {
            tracker_name: plugin.name().to_string(),
            title: parsed.title,
            settings_form: plugin.settings_form(),
        })
    }

    /// Get a topic by id.
    pub fn get_topic(&self, id: i64) -> Result<Topic, TrackerError> {
        self.store
            .get(id)?
            .ok_or(TrackerError::Topic(crate::topic::TopicError::NotFound(id)))
    }

    /// Validate and merge updated settings into a stored topic.
    pub fn update_watch(
        &self,
        id: i64,
        settings: &serde_json::Value,
    ) -> Result<(), TrackerError> {
        let topic = self.get_topic(id)?;
        let plugin = self.plugin(&topic.tracker_name)?;
        let merged = plugin.merge_settings(&topic.display_settings, settings)?;
        self.store.update_display_settings(id, merged)?;
        Ok(())
    }

    /// Remove a topic. Removing an unknown id is an error.
    pub fn remove_topic(&self, id: i64) -> Result<(), TrackerError> {
        self.store.remove(id)?;
        Ok(())
    }

    /// Snapshot of all watched topics.
    pub fn get_watching_torrents(&self) -> Result<Vec<Topic>, TrackerError> {
        Ok(self.store.list()?)
    }

    /// Tracker-level settings (credentials) for a registered plugin.
    pub async fn get_settings(
        &self,
        name: &str,
    ) -> Result<Option<serde_json::Value>, TrackerError> {
        let plugin = self.plugin(name)?;
        match plugin.credentials() {
            Some(credentials) => credentials.get_credentials().await,
            None => Ok(None),
        }
    }

    /// Store tracker-level settings through the credentials capability.
    pub async fn set_settings(
        &self,
        name: &str,
        settings: serde_json::Value,
    ) -> Result<(), TrackerError> {
        let plugin = self.plugin(name)?;
        match plugin.credentials() {
            Some(credentials) => credentials.set_credentials(settings).await,
            None => Err(TrackerError::InvalidSettings(format!(
                "Tracker '{}' does not take settings",
                name
            ))),
        }
    }

    /// Probe connectivity for a registered tracker. Never raises.
    pub async fn check_connection(&self, name: &str) -> bool {
        match self.trackers.get(name) {
            Some(plugin) => plugin.check_connection().await,
            None => {
                warn!(tracker = name, "Connectivity probe for unknown tracker");
                false
            }
        }
    }

    /// Check every registered tracker's topics, yielding one outcome per
    /// topic in store order.
    ///
    /// Per-topic failures, timeouts, and panics become `Failed` outcomes
    /// and never abort the stream. Checks run with bounded parallelism;
    /// `buffered` preserves input order so consumers observe outcomes in
    /// the deterministic per-topic order.
    pub fn check_all(&self) -> Result<BoxStream<'_, TopicOutcome>, TrackerError> {
        let topics = self.store.list()?;

        let stream = futures::stream::iter(topics)
            .map(move |topic| self.check_one(topic))
            .buffered(self.max_parallel_checks)
            .boxed();

        Ok(stream)
    }

    async fn check_one(&self, topic: Topic) -> TopicOutcome {
        let topic_id = topic.id;
        let title = topic.title.clone();

        let Some(plugin) = self.trackers.get(&topic.tracker_name) else {
            return TopicOutcome {
                topic_id,
                title,
                kind: OutcomeKind::Failed(format!(
                    "Topic references unregistered tracker '{}'",
                    topic.tracker_name
                )),
            };
        };

        // Checks run in their own task so a panicking plugin surfaces as a
        // failed outcome instead of tearing down the run.
        let plugin = Arc::clone(plugin);
        let mut handle = tokio::spawn(async move { plugin.check(&topic).await });

        let kind = match tokio::time::timeout(self.check_timeout, &mut handle).await {
            Err(_) => {
                handle.abort();
                OutcomeKind::Failed(format!(
                    "Check timed out after {}s",
                    self.check_timeout.as_secs()
                ))
            }
            Ok(Err(join_err)) => OutcomeKind::Failed(format!("Check aborted: {}", join_err)),
            Ok(Ok(Err(e))) => OutcomeKind::Failed(e.to_string()),
            Ok(Ok(Ok(CheckResult::Unchanged))) => OutcomeKind::Unchanged,
            Ok(Ok(Ok(CheckResult::Downloaded {
                item,
                display_settings,
            }))) => {
                if let Some(settings) = display_settings {
                    if let Err(e) = self.store.update_display_settings(topic_id, settings) {
                        warn!(topic_id, "Failed to persist check state: {}", e);
                    }
                }
                OutcomeKind::Downloaded(item)
            }
        };

        if !matches!(kind, OutcomeKind::Failed(_)) {
            if let Err(e) = self.store.set_last_check(topic_id, chrono::Utc::now()) {
                warn!(topic_id, "Failed to record last_check: {}", e);
            }
        }

        TopicOutcome {
            topic_id,
            title,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTracker;
    use crate::topic::SqliteTopicStore;
    use serde_json::json;

    fn manager_with(plugins: Vec<Arc<dyn TrackerPlugin>>) -> TrackersManager {
        let store = Arc::new(SqliteTopicStore::in_memory().unwrap());
        TrackersManager::new(plugins, store, Duration::from_secs(5), 2)
    }

    #[tokio::test]
    async fn test_add_topic_selects_matching_plugin() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        let id = manager
            .add_topic("http://example.com/x", &json!({}))
            .await
            .unwrap();

        let topic = manager.get_topic(id).unwrap();
        assert_eq!(topic.tracker_name, "trackera");
        assert_eq!(topic.url, "http://example.com/x");
    }

    #[tokio::test]
    async fn test_add_topic_no_matching_tracker() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        let err = manager
            .add_topic("http://other.com/y", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NoMatchingTracker(_)));
    }

    #[tokio::test]
    async fn test_add_topic_invalid_settings_rejected() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com").reject_settings());
        let manager = manager_with(vec![tracker]);

        let err = manager
            .add_topic("http://example.com/x", &json!({"bad": true}))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidSettings(_)));
    }

    #[tokio::test]
    async fn test_prepare_add_topic_does_not_persist() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        let preview = manager
            .prepare_add_topic("http://example.com/x")
            .await
            .unwrap();
        assert_eq!(preview.tracker_name, "trackera");
        assert!(manager.get_watching_torrents().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_topic_then_get_is_not_found() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        let id = manager
            .add_topic("http://example.com/x", &json!({}))
            .await
            .unwrap();
        manager.remove_topic(id).unwrap();

        assert!(manager.get_topic(id).is_err());
        assert!(manager.remove_topic(id).is_err());
    }

    #[tokio::test]
    async fn test_update_watch_merges_settings() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        let id = manager
            .add_topic("http://example.com/x", &json!({"quality": "720p"}))
            .await
            .unwrap();
        manager.update_watch(id, &json!({"quality": "1080p"})).unwrap();

        let topic = manager.get_topic(id).unwrap();
        assert_eq!(topic.display_settings["quality"], "1080p");
    }

    #[tokio::test]
    async fn test_update_watch_unknown_topic() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com"));
        let manager = manager_with(vec![tracker]);

        assert!(manager.update_watch(999, &json!({})).is_err());
    }

    #[tokio::test]
    async fn test_check_connection_failure_is_false_not_error() {
        let tracker = Arc::new(MockTracker::new("trackera", "example.com").offline());
        let manager = manager_with(vec![tracker]);

        assert!(!manager.check_connection("trackera").await);
        assert!(!manager.check_connection("nope").await);
    }

    #[tokio::test]
    async fn test_settings_on_unknown_tracker() {
        let manager = manager_with(vec![]);
        let err = manager.get_settings("ghost").await.unwrap_err();
        assert!(matches!(err, TrackerError::UnknownTracker(_)));
    }

    #[tokio::test]
    async fn test_check_all_isolates_failing_tracker() {
        let good = Arc::new(MockTracker::new("good", "good.com"));
        let bad = Arc::new(MockTracker::new("bad", "bad.com").failing_checks());
        let manager = manager_with(vec![bad, good.clone()]);

        let a = manager
            .add_topic("http://bad.com/a", &json!({}))
            .await
            .unwrap();
        let b = manager
            .add_topic("http://good.com/b", &json!({}))
            .await
            .unwrap();

        let outcomes: Vec<TopicOutcome> = manager.check_all().unwrap().collect().await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].topic_id, a);
        assert!(matches!(outcomes[0].kind, OutcomeKind::Failed(_)));
        assert_eq!(outcomes[1].topic_id, b);
        assert!(matches!(outcomes[1].kind, OutcomeKind::Unchanged));
    }

    #[tokio::test]
    async fn test_check_all_updates_last_check_only_on_success() {
        let good = Arc::new(MockTracker::new("good", "good.com"));
        let bad = Arc::new(MockTracker::new("bad", "bad.com").failing_checks());
        let manager = manager_with(vec![bad, good]);

        let a = manager
            .add_topic("http://bad.com/a", &json!({}))
            .await
            .unwrap();
        let b = manager
            .add_topic("http://good.com/b", &json!({}))
            .await
            .unwrap();

        let _: Vec<TopicOutcome> = manager.check_all().unwrap().collect().await;

        assert!(manager.get_topic(a).unwrap().last_check.is_none());
        assert!(manager.get_topic(b).unwrap().last_check.is_some());
    }

    #[tokio::test]
    async fn test_check_all_times_out_stuck_plugin() {
        let store = Arc::new(SqliteTopicStore::in_memory().unwrap());
        let stuck = Arc::new(MockTracker::new("stuck", "stuck.com").hanging_checks());
        let manager = TrackersManager::new(
            vec![stuck],
            store,
            Duration::from_millis(50),
            1,
        );

        manager
            .add_topic("http://stuck.com/a", &json!({}))
            .await
            .unwrap();

        let outcomes: Vec<TopicOutcome> = manager.check_all().unwrap().collect().await;
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0].kind {
            OutcomeKind::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("Expected Failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_reports_credentials_capability() {
        let plain = Arc::new(MockTracker::new("plain", "plain.com"));
        let manager = manager_with(vec![plain]);

        let infos = manager.list();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "plain");
        assert!(!infos[0].supports_credentials);
    }
}
