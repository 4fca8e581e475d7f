use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_instance, new_instance_form, transfer_instance, use_instance, view_instance,
};

pub fn init_instances_view_router() -> Router<AppState> {
    Router::new().route(
        "/api/v1/reagents/{reagent_id}/instances/{instance_id}",
        get(view_instance),
    )
}

pub fn init_instance_form_router() -> Router<AppState> {
    Router::new().route("/reagents/{reagent_id}/instances/new", get(new_instance_form))
}

pub fn init_instances_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/reagents/{reagent_id}/instances", post(create_instance))
        .route(
            "/api/v1/reagents/{reagent_id}/instances/{instance_id}/use",
            post(use_instance),
        )
        .route(
            "/api/v1/reagents/{reagent_id}/instances/{instance_id}/transfer",
            post(transfer_instance),
        )
}
