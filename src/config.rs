use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use thiserror::Error;

use crate::location::LocationPolicy;
use crate::track::StopoverPolicy;
use crate::web::config::{ApiKey, WebConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: LocationPolicy,
    pub stopover: StopoverPolicy,
    pub web: WebConfig,
    pub api_keys: Vec<ApiKey>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

/// Parse a humantime string such as `2m` or `90s` into a chrono duration.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::config::Permission;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("{}").unwrap();
        assert_eq!(config.location, LocationPolicy::default());
        assert_eq!(config.stopover, StopoverPolicy::default());
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
location:
  significant_time_delta: 90s
  significant_accuracy_delta_m: 150
stopover:
  radius_m: 8
  max_interval: 5m
web:
  bind: 127.0.0.1:9000
api_keys:
  - key: secret
    name: phone
    permissions: [submit_fixes, read_track]
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.location.significant_time_delta, Duration::seconds(90));
        assert_eq!(config.location.significant_accuracy_delta_m, 150.0);
        assert_eq!(config.stopover.radius_m, 8.0);
        assert_eq!(config.stopover.max_interval, Duration::minutes(5));
        assert_eq!(config.web.bind, "127.0.0.1:9000");

        let key = config.find_api_key("secret").unwrap();
        assert_eq!(key.name, "phone");
        assert!(key.permissions.contains(&Permission::SubmitFixes));
        assert!(!key.permissions.contains(&Permission::ControlRecording));
        assert!(config.find_api_key("other").is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_str("location:\n  significant_accuracy_delta_m: 50\n").unwrap();
        assert_eq!(config.location.significant_accuracy_delta_m, 50.0);
        assert_eq!(config.location.significant_time_delta, Duration::minutes(2));
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        assert!(Config::from_str("stopover:\n  max_interval: soon\n").is_err());
    }
}
