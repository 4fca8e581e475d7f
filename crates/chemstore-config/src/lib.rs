//! # Chemstore Config
//!
//! Immutable configuration loaded once from the environment at startup and
//! shared by reference afterwards:
//!
//! - [`app`]: process-wide settings (secret, database, allowed hosts, logging)
//! - [`jwt`]: identity token and cookie settings
//!
//! # Example
//!
//! ```ignore
//! use chemstore_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! ```

pub mod app;
pub mod jwt;

// Re-export commonly used types at crate root
pub use app::{AppConfig, ConfigError};
pub use jwt::JwtConfig;
