use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use chemstore_auth::xsrf;
use chemstore_core::AppError;
use chemstore_db::classify;
use chemstore_db::storages::Storage;

use crate::feedback::{FormRejection, storage_error, storage_rejection};
use crate::middleware::context::RequestContext;
use crate::pagination::SearchQuery;
use crate::state::AppState;
use crate::validator::{ValidatedJson, check_form};

use super::model::{CreateStorageRequest, NewStorageForm, StorageView, StoragesPage};
use super::service::StorageService;

pub const STORAGES_ACTION: &str = "/api/v1/storages";

/// Storage units filtered by name prefix, one page at a time.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn list_storages(
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> Result<Json<StoragesPage>, FormRejection> {
    let caller = ctx.caller()?;
    let query = check_form(query, &ctx.sanitizer, &ctx.validator)?;

    let (range, caller) =
        StorageService::list_storages(&ctx.batch, caller, query.search(), query.offset())
            .await
            .map_err(|err| storage_error(classify(&err)))?;

    Ok(Json(StoragesPage {
        next_offset: range.next_offset(),
        storages: range.storages,
        caller,
    }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn view_storage(
    ctx: RequestContext,
    Path(storage_id): Path<String>,
) -> Result<Json<StorageView>, AppError> {
    let (storage, caller) = StorageService::view_storage(&ctx.batch, ctx.caller()?, &storage_id)
        .await
        .map_err(|err| storage_error(classify(&err)))?;
    Ok(Json(StorageView { storage, caller }))
}

#[instrument(skip_all, parent = &ctx.span)]
pub async fn new_storage_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Json<NewStorageForm> {
    Json(NewStorageForm {
        post_xsrf: xsrf::generate(&state.config.secret_key, &ctx.xsrf_subject(), STORAGES_ACTION),
    })
}

/// Duplicate names and out-of-range cell counts come back as field feedback.
#[instrument(skip_all, parent = &ctx.span)]
pub async fn create_storage(
    ctx: RequestContext,
    ValidatedJson(request): ValidatedJson<CreateStorageRequest>,
) -> Result<(StatusCode, Json<Storage>), FormRejection> {
    let storage = StorageService::create_storage(&ctx.batch, &request.name, request.cells)
        .await
        .map_err(|err| storage_rejection::<Storage>(&err, &request))?;
    Ok((StatusCode::CREATED, Json(storage)))
}
