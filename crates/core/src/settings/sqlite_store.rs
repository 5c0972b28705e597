//! SQLite-backed settings store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{SettingsError, SettingsStore};

/// SQLite-backed plugin settings store.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Create a new SQLite settings store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, SettingsError> {
        let conn = Connection::open(path).map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite settings store (useful for testing).
    pub fn in_memory() -> Result<Self, SettingsError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SettingsError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plugin_settings (
                plugin_name TEXT PRIMARY KEY,
                settings TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(())
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, plugin_name: &str) -> Result<Option<serde_json::Value>, SettingsError> {
        let conn = self.conn.lock().unwrap();

        let json: Option<String> = conn
            .query_row(
                "SELECT settings FROM plugin_settings WHERE plugin_name = ?",
                params![plugin_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        json.map(|j| {
            serde_json::from_str(&j).map_err(|e| SettingsError::Serialization(e.to_string()))
        })
        .transpose()
    }

    fn set(&self, plugin_name: &str, settings: &serde_json::Value) -> Result<(), SettingsError> {
        let conn = self.conn.lock().unwrap();

        let json = serde_json::to_string(settings)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO plugin_settings (plugin_name, settings, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(plugin_name) DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at",
            params![plugin_name, json, Utc::now().to_rfc3339()],
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        assert!(store.get("transmission").unwrap().is_none());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        store
            .set("login", &json!({"username": "admin", "password": "hunter2"}))
            .unwrap();

        let settings = store.get("login").unwrap().unwrap();
        assert_eq!(settings["username"], "admin");
    }

    #[test]
    fn test_set_replaces_existing() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        store.set("login", &json!({"username": "a"})).unwrap();
        store.set("login", &json!({"username": "b"})).unwrap();

        let settings = store.get("login").unwrap().unwrap();
        assert_eq!(settings["username"], "b");
    }

    #[test]
    fn test_settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        {
            let store = SqliteSettingsStore::new(&path).unwrap();
            store.set("transmission", &json!({"url": "http://t"})).unwrap();
        }

        let store = SqliteSettingsStore::new(&path).unwrap();
        assert_eq!(store.get("transmission").unwrap().unwrap()["url"], "http://t");
    }
}
