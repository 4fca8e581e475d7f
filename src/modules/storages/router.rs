use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    STORAGES_ACTION, create_storage, list_storages, new_storage_form, view_storage,
};

pub fn init_storages_view_router() -> Router<AppState> {
    Router::new()
        .route(STORAGES_ACTION, get(list_storages))
        .route("/api/v1/storages/{storage_id}", get(view_storage))
}

pub fn init_storage_form_router() -> Router<AppState> {
    Router::new().route("/storages/new", get(new_storage_form))
}

pub fn init_storages_api_router() -> Router<AppState> {
    Router::new().route(STORAGES_ACTION, post(create_storage))
}
