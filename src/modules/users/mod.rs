pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_me_router, init_users_api_router, init_users_view_router};
