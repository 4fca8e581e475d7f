pub mod auth;
pub mod instances;
pub mod reagents;
pub mod storages;
pub mod users;
