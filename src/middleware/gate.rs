//! The authorization gate.
//!
//! Every guarded route runs this state machine, fresh per request:
//!
//! 1. **Host check**: the `Host` must be in the allow-list, else 403.
//! 2. **Identity resolution** (skipped for auth-exempt routes): a missing or
//!    invalid `access` cookie leaves the caller anonymous.
//! 3. **Renewal**: a valid token past its renewal threshold is reissued from
//!    its own claims and trusted without a database read.
//! 4. **User refresh**: otherwise the caller's record is fetched; a missing,
//!    malformed or inactive account leaves the caller anonymous, and a fresh
//!    token bound to the current role is issued.
//! 5. Anonymous callers on routes requiring authentication get 401.
//! 6. **Anti-forgery** (unsafe methods on non-exempt routes): the `_xsrf`
//!    header must match the caller and the exact request path, else 403.
//! 7. **Role check** (routes requiring authentication), else 403.
//! 8. **Dispatch** with a [`RequestContext`] in the request extensions.
//!
//! A refreshed cookie is attached to whatever response comes back, unless the
//! handler set its own `access` cookie.

use axum::{
    Router,
    extract::{OriginalUri, Request, State},
    http::{HeaderValue, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use tracing::{Span, error, info, warn};
use uuid::Uuid;

use chemstore_auth::{COOKIE_NAME, XSRF_HEADER, read_token, token_cookie, xsrf};
use chemstore_core::{AppError, Role};
use chemstore_db::{ClassifiedError, classify, users::GetUserById};

use crate::middleware::context::RequestContext;
use crate::middleware::policy::Settings;
use crate::state::AppState;

/// Gate state bound to one group of routes.
#[derive(Clone, Debug)]
pub struct Gate {
    state: AppState,
    settings: Settings,
}

/// Puts every route of `router` behind the gate with `settings`.
pub fn guarded(router: Router<AppState>, state: &AppState, settings: Settings) -> Router<AppState> {
    let gate = Gate {
        state: state.clone(),
        settings,
    };
    router.route_layer(middleware::from_fn_with_state(gate, authorize))
}

/// Caller identity resolved for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
}

#[derive(Default)]
struct Resolution {
    identity: Identity,
    cookie: Option<Cookie<'static>>,
}

pub async fn authorize(State(gate): State<Gate>, mut req: Request, next: Next) -> Response {
    let Gate { state, settings } = gate;

    let host = request_host(&req);
    if !state.config.host_allowed(&host) {
        info!(host = %host, "Host not allowed");
        return AppError::forbidden().into_response();
    }

    let resolution = if settings.auth_exempt {
        Resolution::default()
    } else {
        let token = read_token(req.headers());
        resolve(&state, token).await
    };
    let Resolution { identity, cookie } = resolution;

    if let Err(rejection) = admit(&state, &settings, &identity, &req) {
        return with_cookie(rejection.into_response(), cookie);
    }

    req.extensions_mut().insert(RequestContext {
        span: Span::current(),
        user_id: identity.user_id,
        role: identity.role,
        batch: state.batch.clone(),
        sanitizer: state.sanitizer,
        validator: state.validator,
    });

    let response = next.run(req).await;
    with_cookie(response, cookie)
}

async fn resolve(state: &AppState, token: Option<String>) -> Resolution {
    let Some(token) = token else {
        return Resolution::default();
    };
    let Some(claims) = state.tokens.validate(&token) else {
        return Resolution::default();
    };
    let role = match claims.acr.parse::<Role>() {
        Ok(role) => role,
        Err(err) => {
            error!(error = %err, "Identity token carries an unknown role");
            return Resolution::default();
        }
    };

    if state.tokens.renewal_eligible(claims.iat) {
        let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
            error!(sub = %claims.sub, "Identity token subject is not a uuid");
            return Resolution::default();
        };
        let cookie = match state.tokens.reissue(&claims) {
            Ok(signed) => Some(token_cookie(&signed, &state.config.jwt)),
            Err(err) => {
                error!(error = ?err, "Token reissue failed");
                None
            }
        };
        info!(user_id = %user_id, "Token renewed");
        return Resolution {
            identity: Identity {
                user_id: Some(user_id),
                role: Some(role),
            },
            cookie,
        };
    }

    let mut caller = GetUserById::new(claims.sub);
    if let Err(err) = state.batch.perform_one(&mut caller).await {
        match classify(&err) {
            ClassifiedError::NotFound | ClassifiedError::InvalidIdentifier => {
                info!("Caller not found")
            }
            ClassifiedError::OperationCancelled => warn!("Caller lookup cancelled"),
            other => panic!("unexpected storage failure resolving caller: {}", other),
        }
        return Resolution::default();
    }

    let Some(user) = caller.user else {
        return Resolution::default();
    };
    if !user.active {
        info!(user_id = %user.id, "Caller is inactive");
        return Resolution::default();
    }

    let cookie = match state.tokens.issue(user.id, user.role) {
        Ok(signed) => Some(token_cookie(&signed, &state.config.jwt)),
        Err(err) => {
            error!(error = ?err, "Token issue failed");
            None
        }
    };
    Resolution {
        identity: Identity {
            user_id: Some(user.id),
            role: Some(user.role),
        },
        cookie,
    }
}

fn admit(
    state: &AppState,
    settings: &Settings,
    identity: &Identity,
    req: &Request,
) -> Result<(), AppError> {
    if settings.auth_required && identity.user_id.is_none() {
        info!("Unauthorized");
        return Err(AppError::unauthorized());
    }

    if !settings.xsrf_exempt && !req.method().is_safe() {
        let token = req
            .headers()
            .get(XSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let subject = identity.user_id.unwrap_or_else(Uuid::nil).to_string();
        let action = request_action(req);

        if !xsrf::valid(token, &state.config.secret_key, &subject, &action) {
            info!(action = %action, "Anti-forgery token rejected");
            return Err(AppError::forbidden());
        }
    }

    if settings.auth_required {
        match identity.role {
            Some(role) if settings.allows(role) => {}
            role => {
                info!(role = ?role, "Role not allowed");
                return Err(AppError::forbidden());
            }
        }
    }

    Ok(())
}

fn request_host(req: &Request) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
        .to_string()
}

/// Path and query of the request as the client sent it.
fn request_action(req: &Request) -> String {
    let uri: &Uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn with_cookie(mut response: Response, cookie: Option<Cookie<'static>>) -> Response {
    let Some(cookie) = cookie else {
        return response;
    };

    let prefix = format!("{}=", COOKIE_NAME);
    let handler_set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix));
    if handler_set_cookie {
        return response;
    }

    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(err) => error!(error = %err, "Refreshed cookie is not a valid header"),
    }
    response
}
