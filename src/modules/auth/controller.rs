use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use chemstore_auth::{empty_token_cookie, token_cookie};
use chemstore_db::users::StorageUser;

use crate::feedback::FormRejection;
use crate::middleware::context::RequestContext;
use crate::state::AppState;
use crate::validator::SanitizedJson;

use super::model::{SignInRequest, SignUpRequest, SignedInResponse};
use super::service::AuthService;

/// Register an `unconfirmed` account and sign it in.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn sign_up(
    State(state): State<AppState>,
    ctx: RequestContext,
    SanitizedJson(request): SanitizedJson<SignUpRequest>,
) -> Result<impl IntoResponse, FormRejection> {
    let user = AuthService::sign_up(&ctx.batch, &ctx.validator, &request).await?;
    let jar = signed_in(&state, &user)?;
    Ok((StatusCode::CREATED, jar, Json(SignedInResponse { user })))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn sign_in(
    State(state): State<AppState>,
    ctx: RequestContext,
    SanitizedJson(request): SanitizedJson<SignInRequest>,
) -> Result<impl IntoResponse, FormRejection> {
    let user = AuthService::sign_in(&ctx.batch, &ctx.validator, &request).await?;
    let jar = signed_in(&state, &user)?;
    Ok((jar, Json(SignedInResponse { user })))
}

/// Replace the identity cookie with an empty, already expired one.
pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    let jar = CookieJar::new().add(empty_token_cookie(&state.config.jwt));
    (jar, StatusCode::NO_CONTENT)
}

fn signed_in(state: &AppState, user: &StorageUser) -> Result<CookieJar, FormRejection> {
    let signed = state.tokens.issue(user.id, user.role)?;
    Ok(CookieJar::new().add(token_cookie(&signed, &state.config.jwt)))
}
