use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use tracing::{info, instrument};

use chemstore_auth::xsrf;
use chemstore_core::{AppError, Role};
use chemstore_db::classify;

use crate::feedback::{FormRejection, parse_path_id, storage_error};
use crate::middleware::context::RequestContext;
use crate::pagination::SearchQuery;
use crate::state::AppState;
use crate::validator::{ValidatedJson, check_form};

use super::model::{CallerResponse, UpdateUserRequest, UserView, UsersPage};
use super::service::UserService;

/// The caller's own record.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn me(ctx: RequestContext) -> Result<Json<CallerResponse>, AppError> {
    let caller = UserService::get_user(&ctx.batch, ctx.caller()?)
        .await
        .map_err(|err| storage_error(classify(&err)))?;
    Ok(Json(CallerResponse::from(caller)))
}

/// Users other than the caller, filtered by name prefix, one page at a time.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn list_users(
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> Result<Json<UsersPage>, FormRejection> {
    let caller = ctx.caller()?;
    let query = check_form(query, &ctx.sanitizer, &ctx.validator)?;

    let (range, caller) =
        UserService::list_users(&ctx.batch, caller, query.search(), query.offset())
            .await
            .map_err(|err| storage_error(classify(&err)))?;

    Ok(Json(UsersPage {
        next_offset: range.next_offset(),
        users: range.users,
        caller,
    }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn view_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    let caller = ctx.caller()?;
    if user_id == caller.to_string() {
        info!("Viewing self through the users view");
        return Err(AppError::forbidden());
    }

    let (user, caller_record) = UserService::view_user(&ctx.batch, caller, &user_id)
        .await
        .map_err(|err| storage_error(classify(&err)))?;

    let put_xsrf = xsrf::generate(
        &state.config.secret_key,
        &ctx.xsrf_subject(),
        &format!("/api/v1/users/{}", user_id),
    );

    Ok(Json(UserView {
        user,
        caller: caller_record,
        put_xsrf,
    }))
}

/// Sets role and active flag of another user. Granting `admin` is reserved
/// for the bootstrap tool.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn update_user(
    ctx: RequestContext,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<Value>, FormRejection> {
    let caller = ctx.caller()?;
    let id = parse_path_id(&user_id)?;
    if id == caller {
        info!("Updating self");
        return Err(AppError::forbidden().into());
    }
    if request.role == Role::Admin {
        info!("Granting admin role");
        return Err(AppError::forbidden().into());
    }

    UserService::update_user(&ctx.batch, id, request.role, request.active)
        .await
        .map_err(|err| storage_error(classify(&err)))?;

    Ok(Json(json!({
        "id": id,
        "role": request.role,
        "active": request.active,
    })))
}
