//! # Chemstore Core
//!
//! Foundational types shared by every chemstore crate:
//!
//! - [`errors`]: HTTP-facing application error with JSON response conversion
//! - [`labels`]: field-addressable localized errors and per-entity label tables
//! - [`password`]: password hashing and comparison
//! - [`roles`]: the fixed set of user roles
//! - [`sanitize`]: free-text sanitizer handle

pub mod errors;
pub mod labels;
pub mod password;
pub mod roles;
pub mod sanitize;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use labels::{FieldLabels, LocalizedError, field_key};
pub use password::{hash_password, verify_password};
pub use roles::{Role, RoleParseError};
pub use sanitize::Sanitizer;
