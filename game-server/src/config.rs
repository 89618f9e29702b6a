use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => bail!("unknown store backend {other:?}, expected memory or sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: String,
    /// Directory of client files served for any path the API does not claim.
    pub static_dir: Option<PathBuf>,
    pub list_timeout_seconds: u64,
    pub max_body_bytes: u64,
    pub watcher_cleanup_seconds: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let value = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: value("HOST", "127.0.0.1"),
            port: parse("PORT", value("PORT", "8080"))?,
            store_backend: value("STORE_BACKEND", "sqlite")
                .parse()
                .context("Invalid STORE_BACKEND")?,
            database_url: value("DATABASE_URL", "sqlite://strawberry.db?mode=rwc"),
            static_dir: lookup("STATIC_DIR").filter(|dir| !dir.is_empty()).map(PathBuf::from),
            list_timeout_seconds: parse("LIST_TIMEOUT_SECONDS", value("LIST_TIMEOUT_SECONDS", "45"))?,
            max_body_bytes: parse("MAX_BODY_BYTES", value("MAX_BODY_BYTES", "1048576"))?,
            watcher_cleanup_seconds: parse("WATCHER_CLEANUP_SECONDS", value("WATCHER_CLEANUP_SECONDS", "60"))?,
        })
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_seconds)
    }

    pub fn watcher_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.watcher_cleanup_seconds.max(1))
    }
}

fn parse<T>(key: &str, raw: String) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().with_context(|| format!("Invalid {key}: {raw:?}"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            store_backend: StoreBackend::Sqlite,
            database_url: "sqlite://strawberry.db?mode=rwc".to_string(),
            static_dir: None,
            list_timeout_seconds: 45,
            max_body_bytes: 1024 * 1024,
            watcher_cleanup_seconds: 60,
        }
    }
}
