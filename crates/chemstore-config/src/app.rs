use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::jwt::JwtConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not get '{0}'")]
    Missing(&'static str),
    #[error("Could not parse '{0}'")]
    Invalid(&'static str),
}

const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 10;

pub(crate) fn require_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

pub(crate) fn parse_var<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    require_var(key)?
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(key))
}

/// Process-wide configuration. Built once in `main`, then shared behind an
/// `Arc` and never mutated.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// MAC secret for identity and anti-forgery tokens.
    pub secret_key: String,
    pub database_url: String,
    /// Accepted `Host` header values.
    pub allowed_hosts: Vec<String>,
    pub log_level: Level,
    /// Deadline for one batch round trip.
    pub db_timeout: Duration,
    pub bind_addr: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: require_var("SECRET_KEY")?,
            database_url: require_var("DATABASE_URL")?,
            allowed_hosts: split_hosts(&require_var("ALLOWED_HOSTS")?),
            log_level: log_level_from_env(),
            db_timeout: db_timeout(env::var("DB_TIMEOUT_SECONDS").ok().as_deref())?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt: JwtConfig::from_env()?,
        })
    }

    pub fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.iter().any(|allowed| allowed == host)
    }
}

/// Parses `DB_TIMEOUT_SECONDS`. Unset or blank means 10 seconds; otherwise
/// it must be a positive whole number of seconds.
pub fn db_timeout(raw: Option<&str>) -> Result<Duration, ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_DB_TIMEOUT_SECONDS));
    };
    match raw.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::Invalid("DB_TIMEOUT_SECONDS")),
    }
}

pub fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

fn log_level_from_env() -> Level {
    match env::var("LOG_LEVEL").as_deref() {
        Ok("DEBUG") => Level::DEBUG,
        Ok("WARN") => Level::WARN,
        Ok("ERROR") => Level::ERROR,
        Ok("INFO") => Level::INFO,
        _ => {
            eprintln!("Could not get 'LOG_LEVEL', set to INFO");
            Level::INFO
        }
    }
}
