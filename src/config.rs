use crate::errors::{ServiceError, ServiceResult};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DATABASE_URL_VAR: &str = "THAL_DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "THAL_DB_MAX_CONNECTIONS";
pub const SEED_LOOKUPS_VAR: &str = "THAL_SEED_LOOKUPS";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://thal_registry.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Process settings for the registry store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Load the standard lookup lists during initialization
    pub seed_lookups: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            seed_lookups: false,
        }
    }
}

impl RegistryConfig {
    /// Read settings from the process environment, after loading a local `.env` if present.
    pub fn from_env() -> ServiceResult<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = value(DATABASE_URL_VAR) {
            config.database_url = url;
        }

        if let Some(raw) = value(MAX_CONNECTIONS_VAR) {
            config.max_connections = match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ServiceError::Configuration(format!(
                        "{} must be a positive integer, got '{}'",
                        MAX_CONNECTIONS_VAR, raw
                    )))
                }
            };
        }

        if let Some(raw) = value(SEED_LOOKUPS_VAR) {
            config.seed_lookups = parse_flag(&raw).ok_or_else(|| {
                ServiceError::Configuration(format!("{} must be true or false, got '{}'", SEED_LOOKUPS_VAR, raw))
            })?;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServiceResult<RegistryConfig> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        RegistryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.database_url, "sqlite://thal_registry.db");
        assert_eq!(config.max_connections, 5);
        assert!(!config.seed_lookups);
    }

    #[test]
    fn test_values_override_defaults() {
        let config = config_from(&[
            (DATABASE_URL_VAR, "sqlite::memory:"),
            (MAX_CONNECTIONS_VAR, " 2 "),
            (SEED_LOOKUPS_VAR, "Yes"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 2);
        assert!(config.seed_lookups);

        let blank = config_from(&[(DATABASE_URL_VAR, "  ")]).unwrap();
        assert_eq!(blank.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for pairs in [
            vec![(MAX_CONNECTIONS_VAR, "0")],
            vec![(MAX_CONNECTIONS_VAR, "five")],
            vec![(SEED_LOOKUPS_VAR, "maybe")],
        ] {
            assert!(matches!(config_from(&pairs), Err(ServiceError::Configuration(_))));
        }
    }
}
