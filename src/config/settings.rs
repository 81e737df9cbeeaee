use crate::services::token_gate::DEFAULT_TOKEN_TTL_HOURS;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{0}")]
    Insecure(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub base_url: String,
    pub token_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let base_url = lookup("BASE_URL").unwrap_or_else(|| "http://localhost:3000".to_string());

        let token_ttl_hours = match lookup("TOKEN_TTL_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TOKEN_TTL_HOURS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        Ok(Self {
            database_url,
            bind_addr,
            base_url,
            token_ttl_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite::memory:")])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
    }

    #[test]
    fn database_url_is_required() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("TOKEN_TTL_HOURS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "not-an-addr"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "BIND_ADDR",
                ..
            })
        ));
    }

    #[test]
    #[serial]
    fn reads_process_environment() {
        env::set_var("DATABASE_URL", "sqlite://data/test.db");
        env::set_var("TOKEN_TTL_HOURS", "48");
        let config = AppConfig::from_env().unwrap();
        env::remove_var("DATABASE_URL");
        env::remove_var("TOKEN_TTL_HOURS");

        assert_eq!(config.database_url, "sqlite://data/test.db");
        assert_eq!(config.token_ttl_hours, 48);
    }
}
