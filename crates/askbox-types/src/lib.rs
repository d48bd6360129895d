pub mod api;
pub mod events;
pub mod mirror;
pub mod models;
