//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Which durable storage backend holds the session slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-lifetime only. Nothing survives a restart.
    Memory,
    /// Single JSON file mapping slot names to values.
    File(PathBuf),
    /// libSQL database with a `slots` table.
    LibSql(PathBuf),
}

/// How sign-in and sign-up credentials are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Every credential is accepted.
    #[default]
    Mock,
    /// Accounts are registered in storage and passwords are verified.
    Local,
}

impl std::str::FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "local" => Ok(Self::Local),
            other => Err(ConfigError::InvalidValue {
                key: "FREELANCE_HUB_AUTH".to_string(),
                message: format!("expected 'mock' or 'local', got '{other}'"),
            }),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub storage: StorageBackend,
    pub auth_mode: AuthMode,
    /// Validate required fields on every onboarding step.
    pub strict_onboarding: bool,
    /// Port for the HTTP API. `None` disables it.
    pub http_port: Option<u16>,
    /// Directory for a daily rolling log file. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            auth_mode: AuthMode::Mock,
            strict_onboarding: false,
            http_port: None,
            log_dir: None,
        }
    }
}

impl HubConfig {
    /// Build from `FREELANCE_HUB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here so tests
    /// don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = lookup("FREELANCE_HUB_DATA_PATH").map(PathBuf::from);

        let storage = match lookup("FREELANCE_HUB_STORAGE")
            .unwrap_or_else(|| "file".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File(
                data_path.unwrap_or_else(|| PathBuf::from("./data/session.json")),
            ),
            "libsql" => StorageBackend::LibSql(
                data_path.unwrap_or_else(|| PathBuf::from("./data/freelance-hub.db")),
            ),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "FREELANCE_HUB_STORAGE".to_string(),
                    message: format!("expected 'memory', 'file' or 'libsql', got '{other}'"),
                });
            }
        };

        let auth_mode = match lookup("FREELANCE_HUB_AUTH") {
            Some(v) => v.parse()?,
            None => AuthMode::default(),
        };

        let strict_onboarding = match lookup("FREELANCE_HUB_STRICT_ONBOARDING") {
            Some(v) => parse_bool("FREELANCE_HUB_STRICT_ONBOARDING", &v)?,
            None => false,
        };

        let http_port = match lookup("FREELANCE_HUB_HTTP_PORT") {
            Some(v) => Some(v.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "FREELANCE_HUB_HTTP_PORT".to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        let log_dir = lookup("FREELANCE_HUB_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            storage,
            auth_mode,
            strict_onboarding,
            http_port,
            log_dir,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_file_storage_and_mock_auth() {
        let config = HubConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::File(PathBuf::from("./data/session.json"))
        );
        assert_eq!(config.auth_mode, AuthMode::Mock);
        assert!(!config.strict_onboarding);
        assert!(config.http_port.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn libsql_with_custom_path() {
        let config = HubConfig::from_lookup(lookup_from(&[
            ("FREELANCE_HUB_STORAGE", "libsql"),
            ("FREELANCE_HUB_DATA_PATH", "/tmp/hub.db"),
            ("FREELANCE_HUB_AUTH", "Local"),
            ("FREELANCE_HUB_STRICT_ONBOARDING", "yes"),
            ("FREELANCE_HUB_HTTP_PORT", "8088"),
        ]))
        .unwrap();
        assert_eq!(config.storage, StorageBackend::LibSql(PathBuf::from("/tmp/hub.db")));
        assert_eq!(config.auth_mode, AuthMode::Local);
        assert!(config.strict_onboarding);
        assert_eq!(config.http_port, Some(8088));
    }

    #[test]
    fn rejects_unknown_storage() {
        let err = HubConfig::from_lookup(lookup_from(&[("FREELANCE_HUB_STORAGE", "redis")]))
            .unwrap_err();
        assert!(err.to_string().contains("FREELANCE_HUB_STORAGE"));
    }

    #[test]
    fn rejects_bad_port_and_bool() {
        assert!(
            HubConfig::from_lookup(lookup_from(&[("FREELANCE_HUB_HTTP_PORT", "99999")])).is_err()
        );
        assert!(
            HubConfig::from_lookup(lookup_from(&[("FREELANCE_HUB_STRICT_ONBOARDING", "maybe")]))
                .is_err()
        );
    }
}
