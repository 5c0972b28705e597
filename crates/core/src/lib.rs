pub mod client;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod settings;
pub mod testing;
pub mod topic;
pub mod tracker;

pub use client::{ClientError, ClientInfo, ClientPlugin, ClientsManager};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use engine::{EngineError, EngineLogger, EngineRunner, EngineStatus, TracingLogger};
pub use settings::{SettingsStore, SqliteSettingsStore};
pub use topic::{NewTopic, Topic, TopicError, TopicStore};
pub use tracker::{
    CheckResult, DownloadItem, OutcomeKind, TopicOutcome, TrackerError, TrackerPlugin,
    TrackersManager,
};
