use super::{Config, ConfigError};

/// Validate cross-field constraints that serde defaults cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.interval_secs == 0 {
        return Err(ConfigError::Invalid(
            "engine.interval_secs must be positive".to_string(),
        ));
    }

    if config.engine.check_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "engine.check_timeout_secs must be positive".to_string(),
        ));
    }

    if config.engine.max_parallel_checks == 0 {
        return Err(ConfigError::Invalid(
            "engine.max_parallel_checks must be at least 1".to_string(),
        ));
    }

    if let Some(ref default) = config.clients.default {
        let configured = match default.as_str() {
            "transmission" => config.clients.transmission.is_some(),
            "watch_dir" => config.clients.watch_dir.is_some(),
            _ => false,
        };
        if !configured {
            return Err(ConfigError::Invalid(format!(
                "clients.default names '{}' but no such client is configured",
                default
            )));
        }
    }

    if let Some(ref direct) = config.trackers.direct {
        if direct.domains.is_empty() {
            return Err(ConfigError::Invalid(
                "trackers.direct.domains must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}
