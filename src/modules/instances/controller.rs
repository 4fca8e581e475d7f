use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};
use uuid::Uuid;

use chemstore_auth::xsrf;
use chemstore_core::AppError;
use chemstore_db::classify;
use chemstore_db::instances::{ReagentInstance, UseOutcome};
use chemstore_db::storages::StorageCell;

use crate::feedback::{FormRejection, parse_path_id, storage_error, storage_rejection};
use crate::middleware::context::RequestContext;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    InstanceView, NewInstanceForm, NewInstanceRequest, TransferRequest, UsedResponse,
};
use super::service::InstanceService;

/// Path instances of `reagent` are created at.
pub fn instances_action(reagent: Uuid) -> String {
    format!("/api/v1/reagents/{}/instances", reagent)
}

fn instance_action(reagent: Uuid, instance: Uuid, verb: &str) -> String {
    format!("{}/{}/{}", instances_action(reagent), instance, verb)
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn view_instance(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((reagent_id, instance_id)): Path<(String, String)>,
) -> Result<Json<InstanceView>, AppError> {
    let (instance, storages, caller) =
        InstanceService::view_instance(&ctx.batch, ctx.caller()?, &reagent_id, &instance_id)
            .await
            .map_err(|err| storage_error(classify(&err)))?;

    let secret = &state.config.secret_key;
    let subject = ctx.xsrf_subject();
    let use_xsrf = xsrf::generate(
        secret,
        &subject,
        &instance_action(instance.reagent, instance.id, "use"),
    );
    let transfer_xsrf = xsrf::generate(
        secret,
        &subject,
        &instance_action(instance.reagent, instance.id, "transfer"),
    );

    Ok(Json(InstanceView {
        instance,
        storages,
        caller,
        use_xsrf,
        transfer_xsrf,
    }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn new_instance_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(reagent_id): Path<String>,
) -> Result<Json<NewInstanceForm>, AppError> {
    let (reagent, storages) = InstanceService::instance_form(&ctx.batch, &reagent_id)
        .await
        .map_err(|err| storage_error(classify(&err)))?;

    let post_xsrf = xsrf::generate(
        &state.config.secret_key,
        &ctx.xsrf_subject(),
        &instances_action(reagent.id),
    );

    Ok(Json(NewInstanceForm {
        reagent,
        storages,
        post_xsrf,
    }))
}

/// A cell outside the storage unit comes back as field feedback; a missing
/// reagent is 404.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn create_instance(
    ctx: RequestContext,
    Path(reagent_id): Path<String>,
    ValidatedJson(request): ValidatedJson<NewInstanceRequest>,
) -> Result<(StatusCode, Json<ReagentInstance>), FormRejection> {
    let reagent = parse_path_id(&reagent_id)?;
    let instance = InstanceService::create_instance(
        &ctx.batch,
        reagent,
        request.expires_at,
        request.storage,
        request.cell,
    )
    .await
    .map_err(|err| storage_rejection::<StorageCell>(&err, &request))?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Marks the instance as used up. Using it again is a conflict.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn use_instance(
    ctx: RequestContext,
    Path((reagent_id, instance_id)): Path<(String, String)>,
) -> Result<Json<UsedResponse>, AppError> {
    let reagent = parse_path_id(&reagent_id)?;
    let id = parse_path_id(&instance_id)?;

    let outcome = InstanceService::use_instance(&ctx.batch, reagent, id)
        .await
        .map_err(|err| storage_error(classify(&err)))?;

    match outcome {
        UseOutcome::Used(used_at) => Ok(Json(UsedResponse { used_at })),
        UseOutcome::AlreadyUsed(used_at) => {
            info!(%used_at, "Instance already used");
            Err(AppError::new(StatusCode::CONFLICT, anyhow!("Already used")))
        }
    }
}

/// Moves an instance still in stock to another cell.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn transfer_instance(
    ctx: RequestContext,
    Path((reagent_id, instance_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<TransferRequest>,
) -> Result<Json<ReagentInstance>, FormRejection> {
    let reagent = parse_path_id(&reagent_id)?;
    let id = parse_path_id(&instance_id)?;

    let instance =
        InstanceService::transfer_instance(&ctx.batch, reagent, id, request.storage, request.cell)
            .await
            .map_err(|err| storage_rejection::<StorageCell>(&err, &request))?;
    Ok(Json(instance))
}
