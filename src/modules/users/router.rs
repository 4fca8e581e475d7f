use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{list_users, me, update_user, view_user};

pub fn init_me_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub fn init_users_view_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", get(list_users))
        .route("/users/{user_id}", get(view_user))
}

pub fn init_users_api_router() -> Router<AppState> {
    Router::new().route("/api/v1/users/{user_id}", put(update_user))
}
