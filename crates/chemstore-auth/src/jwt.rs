//! Identity token lifecycle.
//!
//! Tokens are HS256-signed JWTs carrying [`Claims`]. The manager:
//!
//! - **issues** a token for a user id and role, valid for the configured TTL
//! - **validates** signature, claim structure and expiry, collapsing every
//!   failure into "not authenticated"
//! - decides **renewal eligibility** from the issued-at claim
//! - **reissues** an existing claim set with a fresh expiration
//!
//! Every time-dependent operation has an `_at` variant taking the current
//! unix time explicitly.
//!
//! # Example
//!
//! ```ignore
//! let tokens = TokenManager::new(&config.secret_key, &config.jwt);
//!
//! let signed = tokens.issue(user_id, Role::Assistant)?;
//! if let Some(claims) = tokens.validate(&signed.token) {
//!     if tokens.renewal_eligible(claims.iat) {
//!         let renewed = tokens.reissue(&claims)?;
//!     }
//! }
//! ```

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};
use uuid::Uuid;

use chemstore_config::JwtConfig;
use chemstore_core::{AppError, Role};

use crate::claims::Claims;

/// A signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(secret: &str, jwt_config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds: jwt_config.ttl_seconds(),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issues a token for `subject` with `role`, expiring one TTL from now.
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails.
    pub fn issue(&self, subject: Uuid, role: Role) -> Result<SignedToken, AppError> {
        self.issue_at(subject, role, Utc::now().timestamp())
    }

    pub fn issue_at(&self, subject: Uuid, role: Role, now: i64) -> Result<SignedToken, AppError> {
        let claims = Claims {
            sub: subject.to_string(),
            acr: role.name().to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        self.sign(claims)
    }

    /// Re-signs `claims` with a fresh expiration.
    ///
    /// Subject, role and issued-at are carried over untouched; nothing is
    /// re-checked against the database.
    pub fn reissue(&self, claims: &Claims) -> Result<SignedToken, AppError> {
        self.reissue_at(claims, Utc::now().timestamp())
    }

    pub fn reissue_at(&self, claims: &Claims, now: i64) -> Result<SignedToken, AppError> {
        let claims = Claims {
            exp: now + self.ttl_seconds,
            ..claims.clone()
        };
        self.sign(claims)
    }

    /// Verifies signature, claim structure and expiry.
    ///
    /// Returns `None` for every kind of failure. Causes are only
    /// distinguished in the logs: malformed claims are logged as errors,
    /// bad signatures and expiry as info.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Option<Claims> {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                match err.kind() {
                    ErrorKind::Json(_)
                    | ErrorKind::Utf8(_)
                    | ErrorKind::MissingRequiredClaim(_) => {
                        error!(error = %err, "Malformed identity token claims");
                    }
                    _ => info!(error = %err, "Identity token rejected"),
                }
                return None;
            }
        };

        if now > claims.exp {
            info!("Token expired");
            return None;
        }

        Some(claims)
    }

    /// True once the token is older than one TTL window.
    pub fn renewal_eligible(&self, issued_at: i64) -> bool {
        self.renewal_eligible_at(issued_at, Utc::now().timestamp())
    }

    pub fn renewal_eligible_at(&self, issued_at: i64, now: i64) -> bool {
        now > issued_at.saturating_add(self.ttl_seconds)
    }

    fn sign(&self, claims: Claims) -> Result<SignedToken, AppError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(anyhow!("Failed to create token: {}", e)))?;
        Ok(SignedToken { token, claims })
    }
}
