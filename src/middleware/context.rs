use anyhow::anyhow;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::Span;
use uuid::Uuid;

use chemstore_core::{AppError, Role, Sanitizer};
use chemstore_db::BatchExecutor;

use crate::validator::FormValidator;

/// Request-scoped context built by the authorization gate.
///
/// `user_id` and `role` are `None` for anonymous callers on routes where
/// authentication is optional.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub span: Span,
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
    pub batch: BatchExecutor,
    pub sanitizer: Sanitizer,
    pub validator: FormValidator,
}

impl RequestContext {
    /// The caller's id on routes that require authentication.
    pub fn caller(&self) -> Result<Uuid, AppError> {
        self.user_id.ok_or_else(AppError::unauthorized)
    }

    /// Subject used for anti-forgery tokens; anonymous callers use the nil id.
    pub fn xsrf_subject(&self) -> String {
        self.user_id.unwrap_or_else(Uuid::nil).to_string()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::internal(anyhow!("Route is not behind the authorization gate")))
    }
}
