//! Request authorization.
//!
//! - [`policy`]: the per-route access policies
//! - [`gate`]: the middleware enforcing a policy and resolving the caller
//! - [`context`]: the request context the gate hands to handlers
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::{gate::guarded, policy::ADMIN_ONLY_API};
//!
//! let api = guarded(init_users_api_router(), &state, ADMIN_ONLY_API);
//!
//! async fn handler(ctx: RequestContext) -> Result<Json<Value>, AppError> {
//!     let caller = ctx.caller()?;
//!     // ...
//! }
//! ```

pub mod context;
pub mod gate;
pub mod policy;
