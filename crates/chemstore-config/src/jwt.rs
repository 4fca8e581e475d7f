use crate::app::{ConfigError, parse_var, require_var};

/// Upper bound of `JWT_EXP_DELTA_MINUTES`: one year.
pub const MAX_EXPIRATION_MINUTES: i64 = 365 * 24 * 60;

/// Identity token and cookie transport settings.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// Cookie `Domain` attribute.
    pub domain: String,
    /// Cookie `Secure` attribute.
    pub secure_cookies: bool,
    /// Token time-to-live in minutes.
    pub expiration_delta_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            domain: require_var("JWT_DOMAIN")?,
            secure_cookies: parse_var("JWT_SECURE_COOKIES")?,
            expiration_delta_minutes: expiration_minutes(&require_var("JWT_EXP_DELTA_MINUTES")?)?,
        })
    }

    /// Token time-to-live in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.expiration_delta_minutes.saturating_mul(60)
    }
}

/// Parses `JWT_EXP_DELTA_MINUTES`: a positive minute count of at most
/// [`MAX_EXPIRATION_MINUTES`].
pub fn expiration_minutes(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_EXPIRATION_MINUTES).contains(&minutes) => Ok(minutes),
        _ => Err(ConfigError::Invalid("JWT_EXP_DELTA_MINUTES")),
    }
}
