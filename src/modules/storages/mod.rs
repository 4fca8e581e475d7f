pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_storage_form_router, init_storages_api_router, init_storages_view_router};
