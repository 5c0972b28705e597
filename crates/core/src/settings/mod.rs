//! Persisted per-plugin settings.
//!
//! Tracker credentials and client connection settings are stored as opaque
//! JSON blobs keyed by plugin name, so they survive restarts without the
//! core interpreting them.

mod sqlite_store;
mod store;

pub use sqlite_store::SqliteSettingsStore;
pub use store::{SettingsError, SettingsStore};
