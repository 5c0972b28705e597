use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub trackers: TrackersConfig,
    #[serde(default)]
    pub clients: ClientsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("vigil.db")
}

/// Engine runner configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Seconds between automatic runs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Timeout applied to each per-topic plugin check.
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
    /// How many topic checks may be in flight at once within a run.
    #[serde(default = "default_max_parallel_checks")]
    pub max_parallel_checks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            check_timeout_secs: default_check_timeout_secs(),
            max_parallel_checks: default_max_parallel_checks(),
        }
    }
}

fn default_interval_secs() -> u64 {
    7200
}

fn default_check_timeout_secs() -> u64 {
    60
}

fn default_max_parallel_checks() -> usize {
    4
}

/// Tracker plugin configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackersConfig {
    /// Direct .torrent URL watcher.
    #[serde(default)]
    pub direct: Option<DirectTrackerConfig>,
    /// Cookie-login tracker watcher.
    #[serde(default)]
    pub login: Option<LoginTrackerConfig>,
}

/// Direct tracker plugin configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectTrackerConfig {
    /// Domains whose .torrent URLs this plugin claims.
    pub domains: Vec<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Login tracker plugin configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginTrackerConfig {
    /// Site base URL (e.g., "https://tracker.example.org")
    pub base_url: String,
    /// Login form path relative to the base URL.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_login_path() -> String {
    "/login.php".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Client plugin configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClientsConfig {
    /// Name of the client that receives items when a topic names none.
    #[serde(default)]
    pub default: Option<String>,
    /// Transmission RPC client.
    #[serde(default)]
    pub transmission: Option<TransmissionConfig>,
    /// Watch-directory client.
    #[serde(default)]
    pub watch_dir: Option<WatchDirConfig>,
}

/// Transmission RPC client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransmissionConfig {
    /// RPC URL (e.g., "http://localhost:9091/transmission/rpc")
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Watch-directory client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchDirConfig {
    /// Directory where .torrent files are dropped.
    pub path: PathBuf,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<SanitizedTransmissionConfig>,
}

/// Sanitized Transmission config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTransmissionConfig {
    pub url: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            engine: config.engine.clone(),
            transmission: config
                .clients
                .transmission
                .as_ref()
                .map(|t| SanitizedTransmissionConfig {
                    url: t.url.clone(),
                    password_configured: t.password.as_deref().is_some_and(|p| !p.is_empty()),
                    timeout_secs: t.timeout_secs,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "vigil.db");
        assert_eq!(config.engine.interval_secs, 7200);
        assert_eq!(config.engine.max_parallel_checks, 4);
        assert!(config.clients.default.is_none());
    }

    #[test]
    fn test_deserialize_custom_server_and_engine() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[engine]
interval_secs = 600
check_timeout_secs = 20
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.engine.interval_secs, 600);
        assert_eq!(config.engine.check_timeout_secs, 20);
    }

    #[test]
    fn test_deserialize_tracker_and_client_sections() {
        let toml = r#"
[trackers.direct]
domains = ["example.com", "mirror.example.com"]

[clients]
default = "transmission"

[clients.transmission]
url = "http://localhost:9091/transmission/rpc"
username = "admin"
password = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let direct = config.trackers.direct.as_ref().unwrap();
        assert_eq!(direct.domains.len(), 2);
        assert_eq!(direct.timeout_secs, 30); // default

        assert_eq!(config.clients.default.as_deref(), Some("transmission"));
        let transmission = config.clients.transmission.as_ref().unwrap();
        assert_eq!(transmission.url, "http://localhost:9091/transmission/rpc");
        assert_eq!(transmission.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config = Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            engine: EngineConfig::default(),
            trackers: TrackersConfig::default(),
            clients: ClientsConfig {
                default: Some("transmission".to_string()),
                transmission: Some(TransmissionConfig {
                    url: "http://localhost:9091/transmission/rpc".to_string(),
                    username: Some("admin".to_string()),
                    password: Some("secret".to_string()),
                    timeout_secs: 30,
                }),
                watch_dir: None,
            },
        };

        let sanitized = SanitizedConfig::from(&config);
        let transmission = sanitized.transmission.as_ref().unwrap();
        assert!(transmission.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
