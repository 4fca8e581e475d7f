//! # Chemstore Auth
//!
//! Identity tokens and their transport:
//!
//! - [`claims`]: the four-claim identity payload
//! - [`jwt`]: the token lifecycle manager (issue, validate, renew)
//! - [`cookie`]: the `access` cookie carrying the token
//! - [`xsrf`]: anti-forgery tokens bound to a subject and a request path
//!
//! # Example
//!
//! ```ignore
//! use chemstore_auth::TokenManager;
//!
//! let tokens = TokenManager::new(&config.secret_key, &config.jwt);
//! let signed = tokens.issue(user.id, user.role)?;
//! let claims = tokens.validate(&signed.token);
//! ```

pub mod claims;
pub mod cookie;
pub mod jwt;
pub mod xsrf;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use cookie::{COOKIE_NAME, empty_token_cookie, read_token, token_cookie};
pub use jwt::{SignedToken, TokenManager};
pub use xsrf::XSRF_HEADER;
