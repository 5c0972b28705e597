//! SQLite-backed topic store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewTopic, Topic, TopicError, TopicStore};

/// SQLite-backed topic store.
pub struct SqliteTopicStore {
    conn: Mutex<Connection>,
}

impl SqliteTopicStore {
    /// Create a new SQLite topic store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TopicError> {
        let conn = Connection::open(path).map_err(|e| TopicError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite topic store (useful for testing).
    pub fn in_memory() -> Result<Self, TopicError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TopicError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TopicError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                tracker_name TEXT NOT NULL,
                title TEXT NOT NULL,
                display_settings TEXT NOT NULL,
                last_check TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_topics_tracker_name ON topics(tracker_name);
            "#,
        )
        .map_err(|e| TopicError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_topic(row: &rusqlite::Row) -> rusqlite::Result<Topic> {
        let id: i64 = row.get(0)?;
        let url: String = row.get(1)?;
        let tracker_name: String = row.get(2)?;
        let title: String = row.get(3)?;
        let display_settings_json: String = row.get(4)?;
        let last_check_str: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        let display_settings: serde_json::Value =
            serde_json::from_str(&display_settings_json).unwrap_or(serde_json::Value::Null);

        let last_check = last_check_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Topic {
            id,
            url,
            tracker_name,
            title,
            display_settings,
            last_check,
            created_at,
        })
    }
}

const TOPIC_COLUMNS: &str =
    "id, url, tracker_name, title, display_settings, last_check, created_at";

impl TopicStore for SqliteTopicStore {
    fn create(&self, topic: NewTopic) -> Result<Topic, TopicError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let display_settings_json = serde_json::to_string(&topic.display_settings)
            .map_err(|e| TopicError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO topics (url, tracker_name, title, display_settings, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                topic.url,
                topic.tracker_name,
                topic.title,
                display_settings_json,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TopicError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();

        Ok(Topic {
            id,
            url: topic.url,
            tracker_name: topic.tracker_name,
            title: topic.title,
            display_settings: topic.display_settings,
            last_check: None,
            created_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Topic>, TopicError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {} FROM topics WHERE id = ?", TOPIC_COLUMNS),
            params![id],
            Self::row_to_topic,
        )
        .optional()
        .map_err(|e| TopicError::Database(e.to_string()))
    }

    fn list(&self) -> Result<Vec<Topic>, TopicError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM topics ORDER BY id", TOPIC_COLUMNS))
            .map_err(|e| TopicError::Database(e.to_string()))?;

        let topics = stmt
            .query_map([], Self::row_to_topic)
            .map_err(|e| TopicError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TopicError::Database(e.to_string()))?;

        Ok(topics)
    }

    fn list_by_tracker(&self, tracker_name: &str) -> Result<Vec<Topic>, TopicError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM topics WHERE tracker_name = ? ORDER BY id",
                TOPIC_COLUMNS
            ))
            .map_err(|e| TopicError::Database(e.to_string()))?;

        let topics = stmt
            .query_map(params![tracker_name], Self::row_to_topic)
            .map_err(|e| TopicError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TopicError::Database(e.to_string()))?;

        Ok(topics)
    }

    fn update_display_settings(
        &self,
        id: i64,
        settings: serde_json::Value,
    ) -> Result<(), TopicError> {
        let conn = self.conn.lock().unwrap();

        let settings_json =
            serde_json::to_string(&settings).map_err(|e| TopicError::Database(e.to_string()))?;

        let updated = conn
            .execute(
                "UPDATE topics SET display_settings = ? WHERE id = ?",
                params![settings_json, id],
            )
            .map_err(|e| TopicError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(TopicError::NotFound(id));
        }
        Ok(())
    }

    fn set_last_check(&self, id: i64, at: DateTime<Utc>) -> Result<(), TopicError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn
            .execute(
                "UPDATE topics SET last_check = ? WHERE id = ?",
                params![at.to_rfc3339(), id],
            )
            .map_err(|e| TopicError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(TopicError::NotFound(id));
        }
        Ok(())
    }

    fn remove(&self, id: i64) -> Result<(), TopicError> {
        let conn = self.conn.lock().unwrap();

        let deleted = conn
            .execute("DELETE FROM topics WHERE id = ?", params![id])
            .map_err(|e| TopicError::Database(e.to_string()))?;

        if deleted == 0 {
            return Err(TopicError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_topic(url: &str) -> NewTopic {
        NewTopic {
            url: url.to_string(),
            tracker_name: "direct".to_string(),
            title: "Some Show".to_string(),
            display_settings: json!({"quality": "1080p"}),
        }
    }

    #[test]
    fn test_create_and_get_topic() {
        let store = SqliteTopicStore::in_memory().unwrap();

        let created = store
            .create(new_topic("http://example.com/show.torrent"))
            .unwrap();
        assert!(created.id > 0);
        assert!(created.last_check.is_none());

        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched.url, "http://example.com/show.torrent");
        assert_eq!(fetched.tracker_name, "direct");
        assert_eq!(fetched.display_settings["quality"], "1080p");
    }

    #[test]
    fn test_get_unknown_returns_none() {
        let store = SqliteTopicStore::in_memory().unwrap();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let a = store.create(new_topic("http://example.com/a.torrent")).unwrap();
        let b = store.create(new_topic("http://example.com/b.torrent")).unwrap();

        let topics = store.list().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].id, a.id);
        assert_eq!(topics[1].id, b.id);
    }

    #[test]
    fn test_list_by_tracker_filters() {
        let store = SqliteTopicStore::in_memory().unwrap();
        store.create(new_topic("http://example.com/a.torrent")).unwrap();
        store
            .create(NewTopic {
                tracker_name: "login".to_string(),
                ..new_topic("http://example.com/b.torrent")
            })
            .unwrap();

        assert_eq!(store.list_by_tracker("direct").unwrap().len(), 1);
        assert_eq!(store.list_by_tracker("login").unwrap().len(), 1);
        assert!(store.list_by_tracker("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_update_display_settings() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let topic = store.create(new_topic("http://example.com/a.torrent")).unwrap();

        store
            .update_display_settings(topic.id, json!({"quality": "720p"}))
            .unwrap();
        let fetched = store.get(topic.id).unwrap().unwrap();
        assert_eq!(fetched.display_settings["quality"], "720p");
    }

    #[test]
    fn test_update_unknown_topic_is_not_found() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let err = store.update_display_settings(7, json!({})).unwrap_err();
        assert!(matches!(err, TopicError::NotFound(7)));
    }

    #[test]
    fn test_set_last_check() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let topic = store.create(new_topic("http://example.com/a.torrent")).unwrap();

        let now = Utc::now();
        store.set_last_check(topic.id, now).unwrap();

        let fetched = store.get(topic.id).unwrap().unwrap();
        let recorded = fetched.last_check.unwrap();
        assert!((recorded - now).num_seconds().abs() < 2);
    }

    #[test]
    fn test_remove_then_get_yields_none() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let topic = store.create(new_topic("http://example.com/a.torrent")).unwrap();

        store.remove(topic.id).unwrap();
        assert!(store.get(topic.id).unwrap().is_none());
    }

    #[test]
    fn test_remove_unknown_topic_is_not_found() {
        let store = SqliteTopicStore::in_memory().unwrap();
        let err = store.remove(99).unwrap_err();
        assert!(matches!(err, TopicError::NotFound(99)));
    }

    #[test]
    fn test_topics_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.db");

        let id = {
            let store = SqliteTopicStore::new(&path).unwrap();
            store
                .create(new_topic("http://example.com/persist.torrent"))
                .unwrap()
                .id
        };

        let store = SqliteTopicStore::new(&path).unwrap();
        let fetched = store.get(id).unwrap().unwrap();
        assert_eq!(fetched.url, "http://example.com/persist.torrent");
    }
}
