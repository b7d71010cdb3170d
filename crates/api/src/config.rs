//! Process configuration from `COMANDA_*` environment variables.

use std::net::SocketAddr;

use comanda_observability::LogFormat;
use thiserror::Error;

pub const BIND_ADDR: &str = "COMANDA_BIND_ADDR";
pub const LEAD_SECRET: &str = "COMANDA_LEAD_SECRET";
pub const STORE: &str = "COMANDA_STORE";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SEED_DEMO: &str = "COMANDA_SEED_DEMO";
pub const LOG_FORMAT: &str = "COMANDA_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LEAD_SECRET: &str = "1950";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} is required when COMANDA_STORE=postgres")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub lead_secret: String,
    pub store: StoreBackend,
    pub seed_demo: bool,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: BIND_ADDR,
            value: bind_addr.clone(),
            reason: e.to_string(),
        })?;

        let store = match get(STORE).as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: get(DATABASE_URL).ok_or(ConfigError::Missing(DATABASE_URL))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: STORE,
                    value: other.to_string(),
                    reason: "expected memory or postgres".into(),
                });
            }
        };

        let seed_demo = match get(SEED_DEMO) {
            None => store == StoreBackend::Memory,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: SEED_DEMO,
                value: raw.clone(),
                reason: "expected true or false".into(),
            })?,
        };

        let log_format = match get(LOG_FORMAT) {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|e: comanda_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    key: LOG_FORMAT,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            bind_addr,
            lead_secret: get(LEAD_SECRET).unwrap_or_else(|| DEFAULT_LEAD_SECRET.to_string()),
            store,
            seed_demo,
            log_format,
        })
    }

    /// In-memory store with the demo catalog, for tests and local runs.
    pub fn in_memory(lead_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            lead_secret: lead_secret.into(),
            store: StoreBackend::Memory,
            seed_demo: true,
            log_format: LogFormat::default(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_seeded_memory_store() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(s.lead_secret, "1950");
        assert_eq!(s.store, StoreBackend::Memory);
        assert!(s.seed_demo);
        assert_eq!(s.log_format, LogFormat::Json);
    }

    #[test]
    fn postgres_requires_database_url_and_does_not_seed() {
        assert_eq!(
            settings(&[(STORE, "postgres")]),
            Err(ConfigError::Missing(DATABASE_URL))
        );

        let s = settings(&[(STORE, "Postgres"), (DATABASE_URL, "postgres://localhost/comanda")]).unwrap();
        assert_eq!(
            s.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/comanda".into()
            }
        );
        assert!(!s.seed_demo);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = settings(&[(BIND_ADDR, "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: BIND_ADDR, .. }));

        let err = settings(&[(SEED_DEMO, "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: SEED_DEMO, .. }));

        let err = settings(&[(LOG_FORMAT, "xml")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: LOG_FORMAT, .. }));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let s = settings(&[
            (LEAD_SECRET, "secreto"),
            (SEED_DEMO, "off"),
            (LOG_FORMAT, "pretty"),
            (BIND_ADDR, "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(s.lead_secret, "secreto");
        assert!(!s.seed_demo);
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert_eq!(s.bind_addr.port(), 9000);
    }
}
