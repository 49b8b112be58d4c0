use anyhow::Context;
use serde::Deserialize;

use crate::error::ErrorStatusMode;

/// Which collection backs the user store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORAGE_BACKEND {:?}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub error_status: ErrorStatusMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = get("STORAGE_BACKEND")
            .map(|v| v.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or_default();

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }

        let port = match get("APP_PORT").or_else(|| get("PORT")) {
            Some(v) => v.parse::<u16>().with_context(|| format!("invalid port {:?}", v))?,
            None => 3000,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("invalid DB_MAX_CONNECTIONS {:?}", v))?,
            None => 10,
        };

        let error_status = get("ERROR_STATUS_MODE")
            .map(|v| v.parse::<ErrorStatusMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            storage,
            database_url,
            db_max_connections,
            error_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let cfg = load(&[("DATABASE_URL", "postgres://localhost/users")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.error_status, ErrorStatusMode::Conventional);
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn app_port_wins_over_port() {
        let cfg = load(&[("STORAGE_BACKEND", "memory"), ("PORT", "4000")]).unwrap();
        assert_eq!(cfg.port, 4000);
        let cfg = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("PORT", "4000"),
            ("APP_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("STORAGE_BACKEND", "mongo")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("APP_PORT", "http")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("ERROR_STATUS_MODE", "loud")]).is_err());
    }

    #[test]
    fn legacy_status_mode() {
        let cfg = load(&[("STORAGE_BACKEND", "memory"), ("ERROR_STATUS_MODE", "legacy")]).unwrap();
        assert_eq!(cfg.error_status, ErrorStatusMode::Legacy);
    }
}
