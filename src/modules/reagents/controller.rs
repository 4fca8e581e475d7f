use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use chemstore_auth::xsrf;
use chemstore_core::AppError;
use chemstore_db::classify;
use chemstore_db::reagents::Reagent;

use crate::feedback::{FormRejection, parse_path_id, storage_error, storage_rejection};
use crate::middleware::context::RequestContext;
use crate::pagination::SearchQuery;
use crate::state::AppState;
use crate::validator::{ValidatedJson, check_form};

use super::model::{NewReagentForm, ReagentRequest, ReagentView, ReagentsPage};
use super::service::ReagentService;

pub const REAGENTS_ACTION: &str = "/api/v1/reagents";

/// Reagents whose name or formula starts with `src`, one page at a time.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn list_reagents(
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ReagentsPage>, FormRejection> {
    let caller = ctx.caller()?;
    let query = check_form(query, &ctx.sanitizer, &ctx.validator)?;

    let (range, caller) =
        ReagentService::list_reagents(&ctx.batch, caller, query.search(), query.offset())
            .await
            .map_err(|err| storage_error(classify(&err)))?;

    Ok(Json(ReagentsPage {
        next_offset: range.next_offset(),
        reagents: range.reagents,
        caller,
    }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn view_reagent(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(reagent_id): Path<String>,
) -> Result<Json<ReagentView>, AppError> {
    let (reagent, instances, caller) =
        ReagentService::view_reagent(&ctx.batch, ctx.caller()?, &reagent_id)
            .await
            .map_err(|err| storage_error(classify(&err)))?;

    let (used_instances, instances): (Vec<_>, Vec<_>) =
        instances.into_iter().partition(|i| i.is_used());
    let put_xsrf = xsrf::generate(
        &state.config.secret_key,
        &ctx.xsrf_subject(),
        &format!("{}/{}", REAGENTS_ACTION, reagent.id),
    );

    Ok(Json(ReagentView {
        reagent,
        instances,
        used_instances,
        caller,
        put_xsrf,
    }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn new_reagent_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Json<NewReagentForm> {
    Json(NewReagentForm {
        post_xsrf: xsrf::generate(&state.config.secret_key, &ctx.xsrf_subject(), REAGENTS_ACTION),
    })
}

/// A duplicate name comes back as field feedback.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn create_reagent(
    ctx: RequestContext,
    ValidatedJson(request): ValidatedJson<ReagentRequest>,
) -> Result<(StatusCode, Json<Reagent>), FormRejection> {
    let reagent = ReagentService::create_reagent(&ctx.batch, &request.name, &request.formula)
        .await
        .map_err(|err| storage_rejection::<Reagent>(&err, &request))?;
    Ok((StatusCode::CREATED, Json(reagent)))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn update_reagent(
    ctx: RequestContext,
    Path(reagent_id): Path<String>,
    ValidatedJson(request): ValidatedJson<ReagentRequest>,
) -> Result<Json<Reagent>, FormRejection> {
    let id = parse_path_id(&reagent_id)?;
    let reagent = ReagentService::update_reagent(&ctx.batch, id, &request.name, &request.formula)
        .await
        .map_err(|err| storage_rejection::<Reagent>(&err, &request))?;
    Ok(Json(reagent))
}
