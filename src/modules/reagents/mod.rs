pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_reagent_form_router, init_reagents_api_router, init_reagents_view_router};
