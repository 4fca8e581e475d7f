use axum::{Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;

use crate::logging::logging_middleware;
use crate::middleware::gate::guarded;
use crate::middleware::policy::{
    ADMIN_ONLY_API, ADMIN_ONLY_VIEW, ANY_ROLE_VIEW, ASSISTANT_ONLY_API, ASSISTANT_ONLY_VIEW,
    LECTURER_ASSISTANT_VIEW, UNRESTRICTED,
};
use crate::modules::auth::init_auth_router;
use crate::modules::instances::{
    init_instance_form_router, init_instances_api_router, init_instances_view_router,
};
use crate::modules::reagents::{
    init_reagent_form_router, init_reagents_api_router, init_reagents_view_router,
};
use crate::modules::storages::{
    init_storage_form_router, init_storages_api_router, init_storages_view_router,
};
use crate::modules::users::{init_me_router, init_users_api_router, init_users_view_router};
use crate::state::AppState;

/// Every route sits behind the gate with exactly one policy.
pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(guarded(init_auth_router(), &state, UNRESTRICTED))
        .merge(guarded(init_me_router(), &state, ANY_ROLE_VIEW))
        .merge(guarded(init_users_view_router(), &state, ADMIN_ONLY_VIEW))
        .merge(guarded(init_users_api_router(), &state, ADMIN_ONLY_API))
        .merge(guarded(
            init_storages_view_router(),
            &state,
            LECTURER_ASSISTANT_VIEW,
        ))
        .merge(guarded(init_storage_form_router(), &state, ASSISTANT_ONLY_VIEW))
        .merge(guarded(init_storages_api_router(), &state, ASSISTANT_ONLY_API))
        .merge(guarded(
            init_reagents_view_router(),
            &state,
            LECTURER_ASSISTANT_VIEW,
        ))
        .merge(guarded(init_reagent_form_router(), &state, ASSISTANT_ONLY_VIEW))
        .merge(guarded(init_reagents_api_router(), &state, ASSISTANT_ONLY_API))
        .merge(guarded(
            init_instances_view_router(),
            &state,
            LECTURER_ASSISTANT_VIEW,
        ))
        .merge(guarded(init_instance_form_router(), &state, ASSISTANT_ONLY_VIEW))
        .merge(guarded(init_instances_api_router(), &state, ASSISTANT_ONLY_API))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(logging_middleware))
}
