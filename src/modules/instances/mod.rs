pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_instance_form_router, init_instances_api_router, init_instances_view_router};
