use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    REAGENTS_ACTION, create_reagent, list_reagents, new_reagent_form, update_reagent,
    view_reagent,
};

pub fn init_reagents_view_router() -> Router<AppState> {
    Router::new()
        .route(REAGENTS_ACTION, get(list_reagents))
        .route("/api/v1/reagents/{reagent_id}", get(view_reagent))
}

pub fn init_reagent_form_router() -> Router<AppState> {
    Router::new().route("/reagents/new", get(new_reagent_form))
}

pub fn init_reagents_api_router() -> Router<AppState> {
    Router::new()
        .route(REAGENTS_ACTION, post(create_reagent))
        .route("/api/v1/reagents/{reagent_id}", put(update_reagent))
}
