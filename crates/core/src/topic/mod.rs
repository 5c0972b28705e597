//! Watched subscriptions and their persistence.
//!
//! A topic is one subscription on one tracker site: the canonical URL,
//! the owning tracker plugin's name, and plugin-specific display settings
//! the engine never interprets.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTopicStore;
pub use store::{TopicError, TopicStore};
pub use types::{NewTopic, Topic};
