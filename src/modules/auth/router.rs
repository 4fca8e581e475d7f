use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{sign_in, sign_out, sign_up};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/sign-up", post(sign_up))
        .route("/api/v1/sign-in", post(sign_in))
        .route("/api/v1/sign-out", post(sign_out))
}
