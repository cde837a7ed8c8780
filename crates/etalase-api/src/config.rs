use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use etalase_core::db::ReplicaConfig;
use etalase_core::storage::R2Config;
use etalase_core::upstream::UpstreamConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<etalase_core::Error> for ConfigError {
    fn from(error: etalase_core::Error) -> Self {
        Self::Invalid(error.to_string())
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub cron_secret: String,
    pub sync_interval: Option<Duration>,
    pub upstream: UpstreamConfig,
    pub replica: Option<ReplicaConfig>,
    pub r2: Option<R2Config>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("cron_secret", &"[REDACTED]")
            .field("sync_interval", &self.sync_interval)
            .field("upstream", &self.upstream)
            .field("replica", &self.replica)
            .field("r2", &self.r2)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "ETALASE_API_BIND_ADDR", "127.0.0.1:8080");
        let db_path = PathBuf::from(value_or_default(&lookup, "ETALASE_DB_PATH", "etalase.db"));
        let cron_secret = required_trimmed(&lookup, "CRON_SECRET")?;

        let sync_interval = match optional_trimmed(&lookup, "SYNC_INTERVAL_SECS") {
            None => None,
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    ConfigError::Invalid(
                        "SYNC_INTERVAL_SECS must be an integer in [60, 86400]".to_string(),
                    )
                })?;
                if !(60..=86_400).contains(&secs) {
                    return Err(ConfigError::Invalid(
                        "SYNC_INTERVAL_SECS must be in [60, 86400]".to_string(),
                    ));
                }
                Some(Duration::from_secs(secs))
            }
        };

        let upstream = UpstreamConfig::from_lookup(&lookup)?;
        let replica = ReplicaConfig::from_lookup(&lookup);
        let r2 = R2Config::from_lookup(&lookup)?;

        Ok(Self {
            bind_addr,
            db_path,
            cron_secret,
            sync_interval,
            upstream,
            replica,
            r2,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        db_path: PathBuf::from(":memory:"),
        cron_secret: "cron-secret".to_string(),
        sync_interval: None,
        upstream: UpstreamConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: "token".to_string(),
            timeout: Duration::from_secs(5),
        },
        replica: None,
        r2: None,
    }
}
